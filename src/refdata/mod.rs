// Static reference data: product ids, main contracts, trading sessions

use chrono::NaiveTime;
use std::collections::HashMap;

use crate::config::Settings;
use crate::error::{Error, Result};

/// Read-only lookups resolved once at startup from configuration.
///
/// Failures here are fatal to starting a strategy instance for the product
/// in question.
#[derive(Debug, Clone)]
pub struct ReferenceData {
    products: HashMap<String, String>,
    sessions: HashMap<String, Vec<(NaiveTime, NaiveTime)>>,
    main_contract_suffix: String,
}

impl ReferenceData {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut sessions = HashMap::new();
        for (product_id, rows) in &settings.trading_sessions {
            let mut windows = Vec::with_capacity(rows.len());
            for [start_hour, start_min, end_hour, end_min] in rows {
                let start = NaiveTime::from_hms_opt(*start_hour, *start_min, 0)
                    .ok_or_else(|| invalid_session(product_id, *start_hour, *start_min))?;
                let end = NaiveTime::from_hms_opt(*end_hour, *end_min, 0)
                    .ok_or_else(|| invalid_session(product_id, *end_hour, *end_min))?;
                windows.push((start, end));
            }
            sessions.insert(product_id.clone(), windows);
        }

        Ok(Self {
            products: settings.products.clone(),
            sessions,
            main_contract_suffix: settings.main_contract_suffix.clone(),
        })
    }

    /// Product name -> product id
    pub fn product_id(&self, name: &str) -> Result<&str> {
        self.products
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| Error::ReferenceDataNotFound(format!("product '{name}'")))
    }

    /// Product id -> main contract id.
    ///
    /// Appends the configured contract-month code; a real front-month roll
    /// calculation would slot in here.
    pub fn main_contract(&self, product_id: &str) -> Result<String> {
        if !self.products.values().any(|id| id == product_id) {
            return Err(Error::ReferenceDataNotFound(format!(
                "product id '{product_id}'"
            )));
        }
        Ok(format!("{product_id}{}", self.main_contract_suffix))
    }

    /// Trading-session windows for a product id, local exchange time
    pub fn trading_sessions(&self, product_id: &str) -> Result<&[(NaiveTime, NaiveTime)]> {
        self.sessions
            .get(product_id)
            .map(Vec::as_slice)
            .ok_or_else(|| {
                Error::ReferenceDataNotFound(format!("trading sessions for '{product_id}'"))
            })
    }
}

fn invalid_session(product_id: &str, hour: u32, minute: u32) -> Error {
    Error::ReferenceDataNotFound(format!(
        "invalid session time {hour:02}:{minute:02} for '{product_id}'"
    ))
}

/// Whether `t` falls inside any window, both endpoints inclusive
pub fn in_session(t: NaiveTime, windows: &[(NaiveTime, NaiveTime)]) -> bool {
    windows.iter().any(|(start, end)| *start <= t && t <= *end)
}
