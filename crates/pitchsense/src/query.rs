//! Read side: fetch analysis records on behalf of a requester.

use crate::db::{analysis_repo, Database};
use crate::error::QueryError;
use crate::identity::Identity;
use crate::record::AnalysisRecord;

pub struct QueryService {
    db: Database,
    auth_disabled: bool,
}

impl QueryService {
    /// `auth_disabled` comes from explicit configuration
    /// (`Config::auth_disabled`), never from ambient environment state.
    pub fn new(db: Database, auth_disabled: bool) -> Self {
        if auth_disabled {
            log::warn!(
                "Authorization checks are DISABLED; every record is visible to every requester"
            );
        }
        Self { db, auth_disabled }
    }

    /// Fetches one record. Unknown id beats ownership: a record that
    /// does not exist is `NotFound` for everyone; a record the requester
    /// does not own is `Forbidden`.
    pub fn get_one(
        &self,
        analysis_id: &str,
        requester: &Identity,
    ) -> Result<AnalysisRecord, QueryError> {
        let record = analysis_repo::find_by_id(&self.db, analysis_id)?
            .ok_or_else(|| QueryError::NotFound(analysis_id.to_string()))?;

        if !self.auth_disabled && record.owner_id != requester.uid {
            return Err(QueryError::Forbidden(analysis_id.to_string()));
        }

        Ok(record)
    }

    /// Lists records visible to the requester, newest first.
    pub fn list_for(&self, requester: &Identity) -> Result<Vec<AnalysisRecord>, QueryError> {
        let records = if self.auth_disabled {
            analysis_repo::list_all(&self.db)?
        } else {
            analysis_repo::list_by_owner(&self.db, &requester.uid)?
        };
        Ok(records)
    }
}
