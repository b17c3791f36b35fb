use std::sync::Arc;

use rosfleet_api::{Connector, DeviceCredentials, Params};
use tracing::info;

use super::{Link, created_id};
use crate::error::CoreError;
use crate::model::{AddressListEntry, FirewallRule};
use crate::reconcile::{self, Category, MANAGED_MARKER, ReconcileSummary};

/// NAT, filter, mangle and address-list management.
pub struct FirewallFacade<C: Connector> {
    link: Link<C>,
}

impl<C: Connector> FirewallFacade<C> {
    pub fn new(credentials: DeviceCredentials, connector: Arc<C>) -> Self {
        Self {
            link: Link::new(credentials, connector),
        }
    }

    pub async fn list_nat(&self) -> Result<Vec<FirewallRule>, CoreError> {
        self.link.list(Category::NatRule.menu()).await
    }

    pub async fn list_filter(&self) -> Result<Vec<FirewallRule>, CoreError> {
        self.link.list(Category::FilterRule.menu()).await
    }

    pub async fn list_address_lists(&self) -> Result<Vec<AddressListEntry>, CoreError> {
        self.link.list(Category::AddressList.menu()).await
    }

    /// Source-NAT everything leaving `out_interface`.
    pub async fn add_masquerade(&self, out_interface: &str) -> Result<String, CoreError> {
        self.add(
            Category::NatRule,
            Params::new()
                .attr("chain", "srcnat")
                .attr("out-interface", out_interface)
                .attr("action", "masquerade"),
        )
        .await
    }

    /// Drop forwarded traffic from `src_address`.
    pub async fn block_address(&self, src_address: &str) -> Result<String, CoreError> {
        self.add(
            Category::FilterRule,
            Params::new()
                .attr("chain", "forward")
                .attr("src-address", src_address)
                .attr("action", "drop"),
        )
        .await
    }

    pub async fn add_address_list_entry(
        &self,
        list: &str,
        address: &str,
    ) -> Result<String, CoreError> {
        self.add(
            Category::AddressList,
            Params::new().attr("list", list).attr("address", address),
        )
        .await
    }

    /// Make the managed objects of one firewall menu equal to `desired`.
    pub async fn reconcile(
        &self,
        category: Category,
        desired: &[Params],
    ) -> Result<ReconcileSummary, CoreError> {
        if !Category::FIREWALL.contains(&category) {
            return Err(CoreError::ValidationFailed {
                message: format!("{category} is not a firewall category"),
            });
        }
        self.link
            .run(async |session| reconcile::reconcile(session, category, desired).await)
            .await
    }

    /// Remove every managed NAT, filter, mangle and address-list entry in
    /// one session.
    pub async fn clear_managed(&self) -> Result<Vec<ReconcileSummary>, CoreError> {
        let summaries = self
            .link
            .run(async |session| reconcile::clear_many(session, &Category::FIREWALL).await)
            .await?;
        let removed: usize = summaries.iter().map(|s| s.removed).sum();
        info!(host = %self.link.credentials().host, removed, "managed firewall entries cleared");
        Ok(summaries)
    }

    async fn add(&self, category: Category, params: Params) -> Result<String, CoreError> {
        let rows = self
            .link
            .command(
                &format!("{}/add", category.menu()),
                &params.attr("comment", MANAGED_MARKER),
            )
            .await?;
        Ok(created_id(&rows).unwrap_or_default())
    }
}
