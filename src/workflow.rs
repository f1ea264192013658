use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use crate::model::role::Role;

/// Pipeline position of a request. Codes are stored in the `status` column
/// and returned to clients verbatim, so they are part of the wire contract.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Display, EnumString, Serialize, Deserialize, ToSchema,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    PendingManager = 1,
    PendingPurchase = 2,
    Approved = 3,
    Rejected = 4,
    OnHold = 5,
    SentBack = 6,
    Cancelled = 7,
}

impl RequestStatus {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(RequestStatus::PendingManager),
            2 => Some(RequestStatus::PendingPurchase),
            3 => Some(RequestStatus::Approved),
            4 => Some(RequestStatus::Rejected),
            5 => Some(RequestStatus::OnHold),
            6 => Some(RequestStatus::SentBack),
            7 => Some(RequestStatus::Cancelled),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Statuses with no outgoing transitions. ON_HOLD is not terminal: an
    /// approver can still resume it. SENT_BACK is: there is no resubmit
    /// path, the employee files a new request.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RequestStatus::Approved
                | RequestStatus::Rejected
                | RequestStatus::SentBack
                | RequestStatus::Cancelled
        )
    }
}

/// Verbs recorded in the approval history. SUBMIT only ever appears on the
/// creation row; the rest arrive through the status-update and cancel
/// endpoints. Deserialization funnels through `FromStr` so JSON payloads
/// accept any casing.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Display, EnumString, Serialize, Deserialize, ToSchema,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum RequestAction {
    Submit,
    Approve,
    Reject,
    Hold,
    SendBack,
    Cancel,
}

impl TryFrom<String> for RequestAction {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Display, EnumString, Serialize, Deserialize, ToSchema,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Scheduled,
}

/// Status every new request is created with.
pub const INITIAL_STATUS: RequestStatus = RequestStatus::PendingManager;
pub const INITIAL_PAYMENT_STATUS: PaymentStatus = PaymentStatus::Pending;

/// Outcome of an allowed action: the status to write, plus a payment-status
/// change when the request reaches final approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next_status: RequestStatus,
    pub payment_status: Option<PaymentStatus>,
}

impl Transition {
    fn to(next_status: RequestStatus) -> Self {
        Self { next_status, payment_status: None }
    }

    fn approved() -> Self {
        Self {
            next_status: RequestStatus::Approved,
            payment_status: Some(PaymentStatus::Scheduled),
        }
    }
}

/// Typed refusal reasons. `Display` strings are returned to clients as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum TransitionDenied {
    #[display(fmt = "request is {} and accepts no further actions", status)]
    RequestClosed { status: RequestStatus },

    #[display(fmt = "role {} cannot act on a request in status {}", role, status)]
    RoleNotAllowed { role: Role, status: RequestStatus },

    #[display(fmt = "request is already on hold")]
    AlreadyOnHold,

    #[display(fmt = "you can only cancel your own requests")]
    NotOwner,

    #[display(fmt = "request cannot be cancelled at this stage")]
    NotCancellable { status: RequestStatus },

    #[display(fmt = "a request can only be submitted once")]
    AlreadySubmitted,
}

impl TransitionDenied {
    /// Ownership and closed-request denials map to their own HTTP statuses;
    /// everything else is a role/stage conflict.
    pub fn http_status(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;
        match self {
            TransitionDenied::NotOwner | TransitionDenied::RoleNotAllowed { .. } => {
                StatusCode::FORBIDDEN
            }
            TransitionDenied::RequestClosed { .. }
            | TransitionDenied::AlreadyOnHold
            | TransitionDenied::NotCancellable { .. }
            | TransitionDenied::AlreadySubmitted => StatusCode::CONFLICT,
        }
    }
}

/// The approval state machine.
///
/// `is_owner` is whether the acting user is the request's `created_by`;
/// it only matters for CANCEL. Approval verbs are gated to the role whose
/// stage the request sits in; an ON_HOLD request resumes through whichever
/// approver acts, and that role decides the outcome stage.
pub fn apply(
    status: RequestStatus,
    role: Role,
    action: RequestAction,
    is_owner: bool,
) -> Result<Transition, TransitionDenied> {
    match action {
        RequestAction::Submit => Err(TransitionDenied::AlreadySubmitted),

        RequestAction::Cancel => {
            if !is_owner {
                return Err(TransitionDenied::NotOwner);
            }
            match status {
                RequestStatus::PendingManager | RequestStatus::PendingPurchase => {
                    Ok(Transition::to(RequestStatus::Cancelled))
                }
                _ => Err(TransitionDenied::NotCancellable { status }),
            }
        }

        RequestAction::Approve => {
            let approve_target = approver_gate(status, role)?;
            if approve_target == RequestStatus::Approved {
                Ok(Transition::approved())
            } else {
                Ok(Transition::to(approve_target))
            }
        }
        RequestAction::Reject => {
            approver_gate(status, role)?;
            Ok(Transition::to(RequestStatus::Rejected))
        }
        RequestAction::SendBack => {
            approver_gate(status, role)?;
            Ok(Transition::to(RequestStatus::SentBack))
        }
        RequestAction::Hold => {
            approver_gate(status, role)?;
            if status == RequestStatus::OnHold {
                Err(TransitionDenied::AlreadyOnHold)
            } else {
                Ok(Transition::to(RequestStatus::OnHold))
            }
        }
    }
}

/// Checks that `role` may act on a request in `status` and returns where an
/// APPROVE from that role would land. Managers only act on the manager
/// stage, purchase only on the purchase stage; ON_HOLD accepts either, with
/// the acting role deciding the resume stage.
fn approver_gate(status: RequestStatus, role: Role) -> Result<RequestStatus, TransitionDenied> {
    if status.is_terminal() {
        return Err(TransitionDenied::RequestClosed { status });
    }
    match (status, role) {
        (RequestStatus::PendingManager, Role::Manager)
        | (RequestStatus::OnHold, Role::Manager) => Ok(RequestStatus::PendingPurchase),
        (RequestStatus::PendingPurchase, Role::Purchase)
        | (RequestStatus::OnHold, Role::Purchase) => Ok(RequestStatus::Approved),
        _ => Err(TransitionDenied::RoleNotAllowed { role, status }),
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{
        apply, INITIAL_PAYMENT_STATUS, INITIAL_STATUS, PaymentStatus, RequestAction,
        RequestStatus, Transition, TransitionDenied,
    };
    use crate::model::role::Role;

    fn allow(status: RequestStatus, role: Role, action: RequestAction) -> Transition {
        apply(status, role, action, false).expect("transition should be allowed")
    }

    fn deny(status: RequestStatus, role: Role, action: RequestAction) -> TransitionDenied {
        apply(status, role, action, false).expect_err("transition should be denied")
    }

    #[test]
    fn new_requests_enter_the_manager_stage() {
        assert_eq!(INITIAL_STATUS, RequestStatus::PendingManager);
        assert_eq!(INITIAL_PAYMENT_STATUS, PaymentStatus::Pending);
    }

    #[test]
    fn manager_approval_moves_to_the_purchase_stage() {
        let transition =
            allow(RequestStatus::PendingManager, Role::Manager, RequestAction::Approve);
        assert_eq!(transition.next_status, RequestStatus::PendingPurchase);
        assert_eq!(transition.payment_status, None);
    }

    #[test]
    fn purchase_approval_finalizes_and_schedules_payment() {
        let transition =
            allow(RequestStatus::PendingPurchase, Role::Purchase, RequestAction::Approve);
        assert_eq!(transition.next_status, RequestStatus::Approved);
        assert_eq!(transition.payment_status, Some(PaymentStatus::Scheduled));
    }

    #[test]
    fn either_stage_approver_can_reject() {
        let from_manager =
            allow(RequestStatus::PendingManager, Role::Manager, RequestAction::Reject);
        let from_purchase =
            allow(RequestStatus::PendingPurchase, Role::Purchase, RequestAction::Reject);
        assert_eq!(from_manager.next_status, RequestStatus::Rejected);
        assert_eq!(from_purchase.next_status, RequestStatus::Rejected);
    }

    #[test]
    fn either_stage_approver_can_send_back() {
        let from_manager =
            allow(RequestStatus::PendingManager, Role::Manager, RequestAction::SendBack);
        let from_purchase =
            allow(RequestStatus::PendingPurchase, Role::Purchase, RequestAction::SendBack);
        assert_eq!(from_manager.next_status, RequestStatus::SentBack);
        assert_eq!(from_purchase.next_status, RequestStatus::SentBack);
    }

    #[test]
    fn hold_parks_the_request() {
        let transition = allow(RequestStatus::PendingManager, Role::Manager, RequestAction::Hold);
        assert_eq!(transition.next_status, RequestStatus::OnHold);
    }

    #[test]
    fn holding_a_held_request_is_denied() {
        assert_eq!(
            deny(RequestStatus::OnHold, Role::Manager, RequestAction::Hold),
            TransitionDenied::AlreadyOnHold
        );
    }

    #[test]
    fn manager_resume_from_hold_routes_to_the_purchase_stage() {
        let transition = allow(RequestStatus::OnHold, Role::Manager, RequestAction::Approve);
        assert_eq!(transition.next_status, RequestStatus::PendingPurchase);
        assert_eq!(transition.payment_status, None);
    }

    #[test]
    fn purchase_resume_from_hold_finalizes() {
        let transition = allow(RequestStatus::OnHold, Role::Purchase, RequestAction::Approve);
        assert_eq!(transition.next_status, RequestStatus::Approved);
        assert_eq!(transition.payment_status, Some(PaymentStatus::Scheduled));
    }

    #[test]
    fn manager_cannot_act_on_the_purchase_stage() {
        assert_eq!(
            deny(RequestStatus::PendingPurchase, Role::Manager, RequestAction::Approve),
            TransitionDenied::RoleNotAllowed {
                role: Role::Manager,
                status: RequestStatus::PendingPurchase,
            }
        );
    }

    #[test]
    fn purchase_cannot_act_on_the_manager_stage() {
        assert_eq!(
            deny(RequestStatus::PendingManager, Role::Purchase, RequestAction::Reject),
            TransitionDenied::RoleNotAllowed {
                role: Role::Purchase,
                status: RequestStatus::PendingManager,
            }
        );
    }

    #[test]
    fn employees_and_admins_are_not_approvers() {
        for role in [Role::Employee, Role::Admin] {
            for action in [
                RequestAction::Approve,
                RequestAction::Reject,
                RequestAction::Hold,
                RequestAction::SendBack,
            ] {
                assert_eq!(
                    deny(RequestStatus::PendingManager, role, action),
                    TransitionDenied::RoleNotAllowed {
                        role,
                        status: RequestStatus::PendingManager,
                    }
                );
            }
        }
    }

    #[test]
    fn owner_can_cancel_while_pending() {
        for status in [RequestStatus::PendingManager, RequestStatus::PendingPurchase] {
            let transition = apply(status, Role::Employee, RequestAction::Cancel, true)
                .expect("owner cancel should be allowed");
            assert_eq!(transition.next_status, RequestStatus::Cancelled);
        }
    }

    #[test]
    fn cancel_is_denied_for_non_owners() {
        assert_eq!(
            apply(RequestStatus::PendingManager, Role::Employee, RequestAction::Cancel, false),
            Err(TransitionDenied::NotOwner)
        );
    }

    #[test]
    fn cancel_is_denied_once_the_request_left_the_pending_stages() {
        for status in [
            RequestStatus::Approved,
            RequestStatus::Rejected,
            RequestStatus::OnHold,
            RequestStatus::SentBack,
            RequestStatus::Cancelled,
        ] {
            assert_eq!(
                apply(status, Role::Employee, RequestAction::Cancel, true),
                Err(TransitionDenied::NotCancellable { status })
            );
        }
    }

    #[test]
    fn closed_requests_accept_no_approver_actions() {
        for status in [
            RequestStatus::Approved,
            RequestStatus::Rejected,
            RequestStatus::SentBack,
            RequestStatus::Cancelled,
        ] {
            assert!(status.is_terminal());
            assert_eq!(
                deny(status, Role::Manager, RequestAction::Approve),
                TransitionDenied::RequestClosed { status }
            );
        }
    }

    #[test]
    fn submit_never_applies_to_an_existing_request() {
        assert_eq!(
            apply(RequestStatus::SentBack, Role::Employee, RequestAction::Submit, true),
            Err(TransitionDenied::AlreadySubmitted)
        );
    }

    #[test]
    fn status_codes_round_trip() {
        for code in 1..=7u8 {
            let status = RequestStatus::from_code(code).expect("known code");
            assert_eq!(status.code(), code);
        }
        assert_eq!(RequestStatus::from_code(0), None);
        assert_eq!(RequestStatus::from_code(8), None);
    }

    #[test]
    fn actions_parse_case_insensitively() {
        assert_eq!(RequestAction::from_str("approve").unwrap(), RequestAction::Approve);
        assert_eq!(RequestAction::from_str("SEND_BACK").unwrap(), RequestAction::SendBack);
        assert_eq!(RequestAction::from_str("send_back").unwrap(), RequestAction::SendBack);
        assert!(RequestAction::from_str("ARCHIVE").is_err());
    }

    #[test]
    fn wire_payloads_parse_actions_case_insensitively() {
        assert_eq!(
            serde_json::from_str::<RequestAction>(r#""approve""#).unwrap(),
            RequestAction::Approve
        );
        assert_eq!(
            serde_json::from_str::<RequestAction>(r#""send_back""#).unwrap(),
            RequestAction::SendBack
        );
        assert_eq!(
            serde_json::to_string(&RequestAction::SendBack).unwrap(),
            r#""SEND_BACK""#
        );
        assert!(serde_json::from_str::<RequestAction>(r#""archive""#).is_err());
    }

    #[test]
    fn denials_read_as_client_messages() {
        let denied = deny(RequestStatus::PendingManager, Role::Purchase, RequestAction::Approve);
        assert_eq!(
            denied.to_string(),
            "role PURCHASE cannot act on a request in status PENDING_MANAGER"
        );
    }
}
