//! Marketing campaigns

use std::sync::Arc;

use chrono::{Datelike, Utc};

use crate::domain::Campaign;
use crate::error::DomainError;
use crate::repositories::PortalStore;

pub struct CampaignService {
    portal: Arc<dyn PortalStore>,
}

impl CampaignService {
    pub fn new(portal: Arc<dyn PortalStore>) -> Self {
        Self { portal }
    }

    /// The featured campaign for the current calendar month.
    pub async fn monthly(&self) -> Result<Campaign, DomainError> {
        let now = Utc::now();
        self.portal
            .monthly_featured_campaign(now.month() as i32, now.year())
            .await?
            .ok_or_else(|| {
                DomainError::NotFound(
                    "No featured campaign found for this month".to_string(),
                )
            })
    }
}
