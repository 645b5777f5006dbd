//! Status lifecycle for quotations, invoices, delivery notes and imports.
//!
//! Every status change in the system goes through [`transition`]. Commands
//! call it once up front to fail fast and once more inside their write
//! transaction against the freshly read row.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::document::{DocumentKind, DocumentStatus};
use crate::errors::ServiceError;

use DocumentAction as A;
use DocumentKind as K;
use DocumentStatus as S;

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DocumentAction {
    Submit,
    Approve,
    Reject,
    Revise,
    Send,
    Accept,
    Pay,
    Deliver,
    Verify,
    Cancel,
}

pub fn initial_status(kind: DocumentKind) -> DocumentStatus {
    match kind {
        K::Import => S::Pending,
        K::Quotation | K::Invoice | K::DeliveryNote => S::Draft,
    }
}

/// Statuses a document of `kind` can ever be in, in workflow order.
pub fn statuses(kind: DocumentKind) -> &'static [DocumentStatus] {
    match kind {
        K::Quotation => &[
            S::Draft,
            S::Submitted,
            S::Approved,
            S::Rejected,
            S::Revised,
            S::Sent,
            S::Accepted,
            S::Cancelled,
        ],
        K::Invoice => &[
            S::Draft,
            S::Submitted,
            S::Approved,
            S::Rejected,
            S::Revised,
            S::Sent,
            S::Paid,
            S::Cancelled,
        ],
        K::DeliveryNote => &[S::Draft, S::Sent, S::Delivered, S::Cancelled],
        K::Import => &[S::Pending, S::Verified, S::Cancelled],
    }
}

/// Looks up the target status for `action` applied to a `kind` document
/// currently in `from`. `None` means the pair is not in the table.
pub fn next_status(
    kind: DocumentKind,
    from: DocumentStatus,
    action: DocumentAction,
) -> Option<DocumentStatus> {
    let to = match (kind, from, action) {
        (K::Quotation | K::Invoice, S::Draft | S::Revised, A::Submit) => S::Submitted,
        (K::Quotation | K::Invoice, S::Submitted, A::Approve) => S::Approved,
        (K::Quotation | K::Invoice, S::Submitted, A::Reject) => S::Rejected,
        (K::Quotation | K::Invoice, S::Rejected, A::Revise) => S::Revised,
        (K::Quotation | K::Invoice, S::Approved, A::Send) => S::Sent,
        (
            K::Quotation | K::Invoice,
            S::Draft | S::Submitted | S::Approved | S::Revised,
            A::Cancel,
        ) => S::Cancelled,

        (K::Quotation, S::Sent, A::Accept) => S::Accepted,
        (K::Quotation, S::Sent, A::Reject) => S::Rejected,

        (K::Invoice, S::Sent, A::Pay) => S::Paid,

        (K::DeliveryNote, S::Draft, A::Send) => S::Sent,
        (K::DeliveryNote, S::Sent, A::Deliver) => S::Delivered,
        (K::DeliveryNote, S::Draft, A::Cancel) => S::Cancelled,

        (K::Import, S::Pending, A::Verify) => S::Verified,
        (K::Import, S::Pending, A::Cancel) => S::Cancelled,

        _ => return None,
    };
    Some(to)
}

/// Resolves a transition or rejects it with `InvalidStatus`.
pub fn transition(
    kind: DocumentKind,
    from: DocumentStatus,
    action: DocumentAction,
) -> Result<DocumentStatus, ServiceError> {
    next_status(kind, from, action).ok_or_else(|| {
        ServiceError::InvalidStatus(format!(
            "cannot {} a {} in status {}",
            action, kind, from
        ))
    })
}

/// Actions that are currently allowed, in declaration order.
pub fn available_actions(kind: DocumentKind, status: DocumentStatus) -> Vec<DocumentAction> {
    use strum::IntoEnumIterator;

    DocumentAction::iter()
        .filter(|action| next_status(kind, status, *action).is_some())
        .collect()
}

/// Statuses in which header and line items may still be replaced.
pub fn is_editable(kind: DocumentKind, status: DocumentStatus) -> bool {
    matches!(
        (kind, status),
        (K::Quotation | K::Invoice, S::Draft | S::Revised)
            | (K::DeliveryNote, S::Draft)
            | (K::Import, S::Pending)
    )
}

pub fn is_deletable(kind: DocumentKind, status: DocumentStatus) -> bool {
    status == S::Cancelled || is_editable(kind, status)
}

pub fn ensure_editable(kind: DocumentKind, status: DocumentStatus) -> Result<(), ServiceError> {
    if is_editable(kind, status) {
        Ok(())
    } else {
        Err(ServiceError::InvalidStatus(format!(
            "{} in status {} can no longer be edited",
            kind, status
        )))
    }
}

pub fn ensure_deletable(kind: DocumentKind, status: DocumentStatus) -> Result<(), ServiceError> {
    if is_deletable(kind, status) {
        Ok(())
    } else {
        Err(ServiceError::InvalidStatus(format!(
            "{} in status {} cannot be deleted",
            kind, status
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;
    use strum::IntoEnumIterator;

    #[rstest]
    #[case(K::Quotation, S::Draft, A::Submit, S::Submitted)]
    #[case(K::Quotation, S::Revised, A::Submit, S::Submitted)]
    #[case(K::Quotation, S::Submitted, A::Approve, S::Approved)]
    #[case(K::Quotation, S::Submitted, A::Reject, S::Rejected)]
    #[case(K::Quotation, S::Rejected, A::Revise, S::Revised)]
    #[case(K::Quotation, S::Approved, A::Send, S::Sent)]
    #[case(K::Quotation, S::Sent, A::Accept, S::Accepted)]
    #[case(K::Quotation, S::Sent, A::Reject, S::Rejected)]
    #[case(K::Quotation, S::Approved, A::Cancel, S::Cancelled)]
    #[case(K::Invoice, S::Approved, A::Send, S::Sent)]
    #[case(K::Invoice, S::Sent, A::Pay, S::Paid)]
    #[case(K::Invoice, S::Revised, A::Cancel, S::Cancelled)]
    #[case(K::DeliveryNote, S::Draft, A::Send, S::Sent)]
    #[case(K::DeliveryNote, S::Sent, A::Deliver, S::Delivered)]
    #[case(K::DeliveryNote, S::Draft, A::Cancel, S::Cancelled)]
    #[case(K::Import, S::Pending, A::Verify, S::Verified)]
    #[case(K::Import, S::Pending, A::Cancel, S::Cancelled)]
    fn allowed_transitions(
        #[case] kind: DocumentKind,
        #[case] from: DocumentStatus,
        #[case] action: DocumentAction,
        #[case] to: DocumentStatus,
    ) {
        assert_eq!(transition(kind, from, action).unwrap(), to);
    }

    #[rstest]
    #[case(K::Quotation, S::Draft, A::Send)]
    #[case(K::Quotation, S::Submitted, A::Send)]
    #[case(K::Quotation, S::Sent, A::Pay)]
    #[case(K::Quotation, S::Sent, A::Cancel)]
    #[case(K::Invoice, S::Sent, A::Accept)]
    #[case(K::Invoice, S::Sent, A::Reject)]
    #[case(K::Invoice, S::Paid, A::Cancel)]
    #[case(K::DeliveryNote, S::Draft, A::Deliver)]
    #[case(K::DeliveryNote, S::Sent, A::Cancel)]
    #[case(K::Import, S::Verified, A::Verify)]
    #[case(K::Import, S::Pending, A::Submit)]
    fn rejected_transitions(
        #[case] kind: DocumentKind,
        #[case] from: DocumentStatus,
        #[case] action: DocumentAction,
    ) {
        assert_matches!(
            transition(kind, from, action),
            Err(ServiceError::InvalidStatus(_))
        );
    }

    #[test]
    fn table_has_exactly_the_listed_pairs() {
        let mut allowed = 0;
        for kind in DocumentKind::ALL {
            for status in DocumentStatus::iter() {
                allowed += available_actions(kind, status).len();
            }
        }
        // quotation 12, invoice 11, delivery note 3, import 2
        assert_eq!(allowed, 28);
    }

    #[test]
    fn every_reachable_status_is_listed_for_its_kind() {
        for kind in DocumentKind::ALL {
            let listed = statuses(kind);
            assert!(listed.contains(&initial_status(kind)));
            for from in listed {
                for action in available_actions(kind, *from) {
                    let to = next_status(kind, *from, action).unwrap();
                    assert!(listed.contains(&to), "{} {} -> {}", kind, from, to);
                }
            }
        }
    }

    #[test]
    fn terminal_statuses_have_no_actions() {
        for kind in DocumentKind::ALL {
            for status in [S::Accepted, S::Paid, S::Delivered, S::Verified, S::Cancelled] {
                assert!(available_actions(kind, status).is_empty());
            }
        }
    }

    #[test]
    fn initial_statuses_are_editable() {
        for kind in DocumentKind::ALL {
            assert!(is_editable(kind, initial_status(kind)));
        }
        assert_eq!(initial_status(K::Import), S::Pending);
        assert_eq!(initial_status(K::DeliveryNote), S::Draft);
    }

    #[test]
    fn cancelled_is_deletable_but_not_editable() {
        for kind in DocumentKind::ALL {
            assert!(is_deletable(kind, S::Cancelled));
            assert!(!is_editable(kind, S::Cancelled));
        }
        assert!(!is_deletable(K::Invoice, S::Sent));
        assert!(ensure_deletable(K::Quotation, S::Approved).is_err());
    }

    #[test]
    fn rejection_message_names_kind_status_and_action() {
        let err = transition(K::Quotation, S::Draft, A::Send).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid status: cannot send a quotation in status draft"
        );
    }

    #[test]
    fn actions_parse_from_path_segments() {
        use std::str::FromStr;
        for action in DocumentAction::iter() {
            assert_eq!(DocumentAction::from_str(&action.to_string()).unwrap(), action);
        }
        assert!(DocumentAction::from_str("archive").is_err());
    }
}
