use anyhow::Result;
use async_trait::async_trait;
use scylla::IntoTypedRows;
use serde::Deserialize;

use crate::models::ResourceKind;
use crate::storage::template::TableStore;

#[derive(Debug, Clone, Deserialize)]
pub struct ScyllaConfig {
    /// Contact points in `host:port` form.
    pub nodes: Vec<String>,

    pub keyspace: String,

    #[serde(default = "default_replication_factor")]
    pub replication_factor: usize,

    pub user: Option<String>,

    pub password: Option<String>,
}

const fn default_replication_factor() -> usize {
    1
}

/// Table-per-resource layout. Each row is `(id text, record text)`
/// where `record` holds the canonical JSON serialization, so an
/// INSERT is a full replace of the record.
pub struct ScyllaTableStore {
    session: session::Session,
}

impl ScyllaTableStore {
    pub async fn connect(cfg: ScyllaConfig) -> Result<Self> {
        let mut session_cfg = scylla::SessionConfig::new();
        session_cfg.add_known_nodes(&cfg.nodes);
        session_cfg.auth_username = cfg.user.clone();
        session_cfg.auth_password = cfg.password.clone();

        let base = scylla::Session::connect(session_cfg).await?;

        let qry = format!(
            "CREATE KEYSPACE IF NOT EXISTS {} WITH replication = \
            {{'class': 'SimpleStrategy', 'replication_factor': {}}};",
            cfg.keyspace, cfg.replication_factor,
        );
        base.query(qry, &[]).await?;
        base.use_keyspace(cfg.keyspace.clone(), false).await?;

        let session = session::Session::from(base);
        for kind in ResourceKind::ALL {
            let qry = format!(
                "CREATE TABLE IF NOT EXISTS {} (id text PRIMARY KEY, record text);",
                kind.table(),
            );
            session.query(&qry, &[]).await?;
        }

        Ok(Self { session })
    }
}

#[async_trait]
impl TableStore for ScyllaTableStore {
    async fn put(&self, table: &str, id: &str, record: String) -> Result<()> {
        let qry = format!("INSERT INTO {table} (id, record) VALUES (?, ?);");

        self.session
            .query_prepared(&qry, (id.to_string(), record))
            .await?;

        Ok(())
    }

    async fn get(&self, table: &str, id: &str) -> Result<Option<String>> {
        let qry = format!("SELECT record FROM {table} WHERE id = ?;");

        let record = self
            .session
            .query_prepared(&qry, (id.to_string(),))
            .await?
            .rows
            .unwrap_or_default()
            .into_typed::<(String,)>()
            .next()
            .transpose()?
            .map(|v| v.0);

        Ok(record)
    }

    async fn scan(&self, table: &str) -> Result<Vec<String>> {
        let qry = format!("SELECT record FROM {table};");

        let result = self.session.query(&qry, &[]).await?;
        let mut records = Vec::new();
        for row in result.rows.unwrap_or_default().into_typed::<(String,)>() {
            let (record,) = row?;
            records.push(record);
        }

        Ok(records)
    }

    async fn delete(&self, table: &str, id: &str) -> Result<()> {
        let qry = format!("DELETE FROM {table} WHERE id = ?;");

        self.session.query_prepared(&qry, (id.to_string(),)).await?;

        Ok(())
    }
}

mod session {
    use std::fmt::Debug;

    use scylla::frame::value::ValueList;
    use scylla::query::Query;
    use scylla::transport::errors::QueryError;
    use scylla::QueryResult;
    use tracing::{debug, instrument};

    /// Wrapper holding a `CachingSession` so repeated statements are
    /// prepared once.
    pub(super) struct Session(scylla::CachingSession);

    impl From<scylla::Session> for Session {
        fn from(s: scylla::Session) -> Self {
            Self(scylla::CachingSession::from(s, 32))
        }
    }

    impl Session {
        #[instrument(skip(self, query, values), level = "debug")]
        pub async fn query(
            &self,
            query: &str,
            values: impl ValueList + Debug,
        ) -> Result<QueryResult, QueryError> {
            debug!("executing query {}", query);
            self.0.execute(query, &values).await
        }

        #[instrument(skip(self, query, values), level = "debug")]
        pub async fn query_prepared(
            &self,
            query: &str,
            values: impl ValueList + Debug,
        ) -> Result<QueryResult, QueryError> {
            debug!("executing prepared statement {}", query);
            self.0.execute(Query::from(query), &values).await
        }
    }
}
