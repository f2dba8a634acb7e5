//! PostgREST table access

use serde::{de::DeserializeOwned, Serialize};

use super::RemoteBackend;
use crate::error::{Error, Result};
use crate::fetch::Fetch;

/// `eq.` filter value
pub(super) fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

impl RemoteBackend {
    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.url, table)
    }

    /// `GET /rest/v1/{table}` with the given query parameters
    pub(super) async fn select_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        params: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let mut fetch = Fetch::get(&self.client, &self.rest_url(table));
        for (key, value) in params {
            fetch = fetch.query(key, value);
        }
        self.authorize(fetch).await.execute().await
    }

    /// Single row by primary key
    pub(super) async fn select_by_id<T: DeserializeOwned>(
        &self,
        table: &str,
        id: &str,
    ) -> Result<Option<T>> {
        let filter = eq(id);
        let rows: Vec<T> = self
            .select_rows(table, &[("select", "*"), ("id", filter.as_str()), ("limit", "1")])
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Insert one row and return it as stored.
    ///
    /// With `merge` set an existing row with the same key is updated instead.
    pub(super) async fn insert_row<B, T>(&self, table: &str, row: &B, merge: bool) -> Result<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let prefer = if merge {
            "return=representation,resolution=merge-duplicates"
        } else {
            "return=representation"
        };
        let fetch = Fetch::post(&self.client, &self.rest_url(table))
            .header("Prefer", prefer)
            .json(row)?;
        let rows: Vec<T> = self.authorize(fetch).await.execute().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| Error::internal(format!("insert into {} returned no row", table)))
    }

    /// Patch the row with primary key `id` and return it as stored
    pub(super) async fn update_row<B, T>(&self, table: &str, id: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let fetch = Fetch::patch(&self.client, &self.rest_url(table))
            .query("id", &eq(id))
            .header("Prefer", "return=representation")
            .json(body)?;
        let rows: Vec<T> = self.authorize(fetch).await.execute().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| Error::not_found(format!("Row {} in {}", id, table)))
    }
}
