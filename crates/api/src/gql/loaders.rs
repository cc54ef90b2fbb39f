use async_graphql::dataloader::Loader;
use infra::models::{OracleRow, UserRow};
use std::{collections::HashMap, future::Future, sync::Arc};
use uuid::Uuid;

use crate::datasource::{DataSourceError, MarketApi};

// OracleLoader - batch load oracles by ID
#[derive(Clone)]
pub struct OracleLoader {
    api: Arc<dyn MarketApi>,
}

impl OracleLoader {
    pub fn new(api: Arc<dyn MarketApi>) -> Self {
        Self { api }
    }
}

impl Loader<Uuid> for OracleLoader {
    type Value = OracleRow;
    type Error = Arc<DataSourceError>;

    fn load(
        &self,
        keys: &[Uuid],
    ) -> impl Future<Output = std::result::Result<HashMap<Uuid, Self::Value>, Self::Error>> + Send
    {
        let api = self.api.clone();
        let ids: Vec<Uuid> = keys.to_vec();

        async move {
            if ids.is_empty() {
                return Ok(HashMap::new());
            }

            let rows = api.oracles_by_ids(&ids).await.map_err(Arc::new)?;

            Ok(rows.into_iter().map(|r| (r.id, r)).collect())
        }
    }
}

// UserLoader - batch load users by ID
#[derive(Clone)]
pub struct UserLoader {
    api: Arc<dyn MarketApi>,
}

impl UserLoader {
    pub fn new(api: Arc<dyn MarketApi>) -> Self {
        Self { api }
    }
}

impl Loader<Uuid> for UserLoader {
    type Value = UserRow;
    type Error = Arc<DataSourceError>;

    fn load(
        &self,
        keys: &[Uuid],
    ) -> impl Future<Output = std::result::Result<HashMap<Uuid, Self::Value>, Self::Error>> + Send
    {
        let api = self.api.clone();
        let ids: Vec<Uuid> = keys.to_vec();

        async move {
            if ids.is_empty() {
                return Ok(HashMap::new());
            }

            let rows = api.users_by_ids(&ids).await.map_err(Arc::new)?;

            Ok(rows.into_iter().map(|r| (r.id, r)).collect())
        }
    }
}
