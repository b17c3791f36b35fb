// ── Replace-by-marker reconciliation ──
//
// Converges the marker-tagged objects of one menu to a desired list:
// query everything carrying the marker, remove each match, then add each
// desired object in caller order with the marker stamped on. There is no
// diffing and no rollback. Running the same call twice converges to the
// same end state, which is the only guarantee offered.

use rosfleet_api::{DeviceSession, Params, Record};
use serde::Serialize;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use tracing::{info, warn};

use crate::error::CoreError;
use crate::executor::execute;
use crate::session::Session;

/// Comment stamped on every object this crate creates.
pub const MANAGED_MARKER: &str = "API_MANAGED";

/// Object families that can be reconciled.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Category {
    Route,
    #[strum(serialize = "nat")]
    #[serde(rename = "nat")]
    NatRule,
    #[strum(serialize = "filter")]
    #[serde(rename = "filter")]
    FilterRule,
    #[strum(serialize = "mangle")]
    #[serde(rename = "mangle")]
    MangleRule,
    AddressList,
    IpAddress,
    DhcpAlert,
}

impl Category {
    /// Firewall categories cleared together by a full firewall reset.
    pub const FIREWALL: [Category; 4] = [
        Category::NatRule,
        Category::FilterRule,
        Category::MangleRule,
        Category::AddressList,
    ];

    /// Menu path holding objects of this category.
    pub fn menu(self) -> &'static str {
        match self {
            Self::Route => "/ip/route",
            Self::NatRule => "/ip/firewall/nat",
            Self::FilterRule => "/ip/firewall/filter",
            Self::MangleRule => "/ip/firewall/mangle",
            Self::AddressList => "/ip/firewall/address-list",
            Self::IpAddress => "/ip/address",
            Self::DhcpAlert => "/ip/dhcp-server/alert",
        }
    }

    fn command(self, command: &str) -> String {
        format!("{}/{command}", self.menu())
    }
}

/// Which half of the replace failed for one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ObjectOp {
    Remove,
    Add,
}

/// A per-object failure recorded during reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectError {
    pub op: ObjectOp,
    /// `.id` for removals, the attribute summary for additions.
    pub target: String,
    pub message: String,
}

/// Outcome of one reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    pub category: Category,
    pub removed: usize,
    pub added: usize,
    pub errors: Vec<ObjectError>,
}

impl ReconcileSummary {
    fn new(category: Category) -> Self {
        Self {
            category,
            removed: 0,
            added: 0,
            errors: Vec::new(),
        }
    }

    /// `true` when every removal and addition went through.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    fn record_failure(&mut self, op: ObjectOp, target: String, err: &CoreError) {
        let message = err
            .device_message()
            .map_or_else(|| err.to_string(), str::to_owned);
        warn!(category = %self.category, %op, target = %target, error = %message, "object failed");
        self.errors.push(ObjectError {
            op,
            target,
            message,
        });
    }
}

/// Replace every marker-tagged object of `category` with `desired`.
pub async fn reconcile<S: DeviceSession>(
    session: &mut Session<S>,
    category: Category,
    desired: &[Params],
) -> Result<ReconcileSummary, CoreError> {
    reconcile_within(session, category, &Params::new(), desired).await
}

/// Like [`reconcile`], but only objects that also match every query in
/// `scope` are replaced (e.g. DHCP alerts of one interface).
pub async fn reconcile_within<S: DeviceSession>(
    session: &mut Session<S>,
    category: Category,
    scope: &Params,
    desired: &[Params],
) -> Result<ReconcileSummary, CoreError> {
    let existing = managed_objects(session, category, scope).await?;
    let mut summary = ReconcileSummary::new(category);

    let remove_path = category.command("remove");
    for row in &existing {
        let Some(id) = row.id() else {
            summary.record_failure(
                ObjectOp::Remove,
                String::new(),
                &CoreError::Internal("managed object without .id".into()),
            );
            continue;
        };
        match execute(session, &remove_path, &Params::new().attr(".id", id)).await {
            Ok(_) => summary.removed += 1,
            Err(err) if err.is_connection() => return Err(err),
            Err(err) => summary.record_failure(ObjectOp::Remove, id.to_owned(), &err),
        }
    }

    let add_path = category.command("add");
    for object in desired {
        let params = object.clone().attr("comment", MANAGED_MARKER);
        match execute(session, &add_path, &params).await {
            Ok(_) => summary.added += 1,
            Err(err) if err.is_connection() => return Err(err),
            Err(err) => summary.record_failure(ObjectOp::Add, object.summary(), &err),
        }
    }

    info!(
        host = %session.host(),
        category = %category,
        removed = summary.removed,
        added = summary.added,
        failed = summary.errors.len(),
        "reconciled"
    );
    Ok(summary)
}

/// Remove every marker-tagged object of `category`.
pub async fn clear<S: DeviceSession>(
    session: &mut Session<S>,
    category: Category,
) -> Result<ReconcileSummary, CoreError> {
    reconcile(session, category, &[]).await
}

/// Clear several categories in order on one session.
pub async fn clear_many<S: DeviceSession>(
    session: &mut Session<S>,
    categories: &[Category],
) -> Result<Vec<ReconcileSummary>, CoreError> {
    let mut summaries = Vec::with_capacity(categories.len());
    for &category in categories {
        summaries.push(clear(session, category).await?);
    }
    Ok(summaries)
}

/// Marker-tagged rows of `category` matching `scope`. The query is also
/// applied locally so an over-broad device reply can never widen the set.
async fn managed_objects<S: DeviceSession>(
    session: &mut Session<S>,
    category: Category,
    scope: &Params,
) -> Result<Vec<Record>, CoreError> {
    let mut query = Params::new().query("comment", MANAGED_MARKER);
    for (key, value) in scope.query_pairs() {
        query = query.query(key, value);
    }
    let rows = execute(session, &category.command("print"), &query).await?;
    Ok(rows
        .into_iter()
        .filter(|row| {
            query
                .query_pairs()
                .all(|(k, v)| row.text(k).as_deref() == Some(v))
        })
        .collect())
}
