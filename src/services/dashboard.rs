use sea_orm::{sea_query::Expr, ColumnTrait, EntityTrait, QueryFilter, QuerySelect};
use serde::Serialize;
use std::{collections::HashMap, str::FromStr, sync::Arc};
use tracing::{instrument, warn};
use utoipa::ToSchema;

use super::document_lifecycle;
use crate::{
    auth::{Actor, BranchAccessPolicy},
    db::DbPool,
    entities::document::{self, DocumentKind, DocumentStatus},
    errors::ServiceError,
};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatusCount {
    pub status: DocumentStatus,
    pub count: u64,
}

/// One kanban lane: a document kind with a column per status.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BoardLane {
    pub kind: DocumentKind,
    pub total: u64,
    pub columns: Vec<StatusCount>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardBoard {
    pub lanes: Vec<BoardLane>,
}

#[derive(Clone)]
pub struct DashboardService {
    db_pool: Arc<DbPool>,
    policy: BranchAccessPolicy,
}

impl DashboardService {
    pub fn new(db_pool: Arc<DbPool>, policy: BranchAccessPolicy) -> Self {
        Self { db_pool, policy }
    }

    /// Document counts by kind and status, limited to the actor's branch
    /// when the actor is branch-scoped.
    #[instrument(skip(self, actor), fields(user_id = %actor.user_id))]
    pub async fn board(&self, actor: &Actor) -> Result<DashboardBoard, ServiceError> {
        let mut select = document::Entity::find()
            .select_only()
            .column(document::Column::Kind)
            .column(document::Column::Status)
            .column_as(Expr::col(document::Column::Id).count(), "count")
            .group_by(document::Column::Kind)
            .group_by(document::Column::Status);
        if let Some(branch_id) = self.policy.scope(actor) {
            select = select.filter(document::Column::BranchId.eq(branch_id));
        }

        let rows: Vec<(String, String, i64)> =
            select.into_tuple().all(&*self.db_pool).await?;

        let mut counts: HashMap<(DocumentKind, DocumentStatus), u64> = HashMap::new();
        for (kind, status, count) in rows {
            match (DocumentKind::from_str(&kind), DocumentStatus::from_str(&status)) {
                (Ok(kind), Ok(status)) => {
                    counts.insert((kind, status), u64::try_from(count).unwrap_or(0));
                }
                _ => warn!(%kind, %status, "skipping unknown kind/status on board"),
            }
        }

        Ok(build_board(&counts))
    }
}

fn build_board(counts: &HashMap<(DocumentKind, DocumentStatus), u64>) -> DashboardBoard {
    let lanes = DocumentKind::ALL
        .iter()
        .map(|&kind| {
            let columns: Vec<StatusCount> = document_lifecycle::statuses(kind)
                .iter()
                .map(|&status| StatusCount {
                    status,
                    count: counts.get(&(kind, status)).copied().unwrap_or(0),
                })
                .collect();
            BoardLane {
                kind,
                total: columns.iter().map(|c| c.count).sum(),
                columns,
            }
        })
        .collect();
    DashboardBoard { lanes }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_has_a_lane_per_kind_with_zero_filled_columns() {
        let mut counts = HashMap::new();
        counts.insert((DocumentKind::Invoice, DocumentStatus::Paid), 3);
        counts.insert((DocumentKind::Invoice, DocumentStatus::Draft), 2);

        let board = build_board(&counts);
        assert_eq!(board.lanes.len(), 4);

        let invoices = &board.lanes[1];
        assert_eq!(invoices.kind, DocumentKind::Invoice);
        assert_eq!(invoices.total, 5);
        assert!(invoices
            .columns
            .iter()
            .any(|c| c.status == DocumentStatus::Submitted && c.count == 0));

        let imports = &board.lanes[3];
        assert_eq!(imports.columns.len(), 3);
        assert_eq!(imports.total, 0);
    }
}
