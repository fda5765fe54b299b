use async_trait::async_trait;
use mysql_async::prelude::Queryable;
use mysql_async::{Opts, OptsBuilder, Pool, PoolConstraints, PoolOpts, Value};

use super::{SqlValue, Statement, Store, StoreError};

/// [`Store`] backed by a `mysql_async` connection pool.
///
/// Works against any MySQL-protocol server; TiDB is the usual target since its
/// online DDL is what produces the shape-change race.
#[derive(Clone)]
pub struct MySqlStore {
    pool: Pool,
}

impl MySqlStore {
    /// Build a pool for `url` holding at most `max_connections` connections.
    ///
    /// No connection is opened until the first statement (or [`ping`](Self::ping)).
    pub fn connect(url: &str, max_connections: usize) -> Result<Self, StoreError> {
        let opts = Opts::from_url(url)
            .map_err(|e| StoreError::client(format!("invalid store URL '{}': {}", url, e)))?;
        let constraints = PoolConstraints::new(1, max_connections.max(1)).ok_or_else(|| {
            StoreError::client(format!("invalid pool size {}", max_connections))
        })?;
        let opts = OptsBuilder::from_opts(opts)
            .pool_opts(PoolOpts::default().with_constraints(constraints));

        Ok(Self {
            pool: Pool::new(opts),
        })
    }

    /// Round-trip a ping over a pooled connection.
    pub async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.pool.get_conn().await?;
        conn.ping().await?;
        Ok(())
    }

    /// Close every pooled connection.
    pub async fn disconnect(self) -> Result<(), StoreError> {
        self.pool.disconnect().await?;
        Ok(())
    }
}

#[async_trait]
impl Store for MySqlStore {
    async fn execute(&self, statement: &Statement) -> Result<u64, StoreError> {
        let mut conn = self.pool.get_conn().await?;
        if statement.args.is_empty() {
            // DDL and SET go over the text protocol
            conn.query_drop(statement.sql.as_str()).await?;
        } else {
            let params: Vec<Value> = statement.args.iter().map(Value::from).collect();
            conn.exec_drop(statement.sql.as_str(), params).await?;
        }
        Ok(conn.affected_rows())
    }
}

impl From<&SqlValue> for Value {
    fn from(value: &SqlValue) -> Self {
        match value {
            SqlValue::Int(v) => Value::Int(*v),
            SqlValue::Text(s) => Value::Bytes(s.as_bytes().to_vec()),
        }
    }
}

impl From<mysql_async::Error> for StoreError {
    fn from(err: mysql_async::Error) -> Self {
        match err {
            mysql_async::Error::Server(server) => {
                StoreError::server(server.code, server.state, server.message)
            }
            other => StoreError::client(other.to_string()),
        }
    }
}
