//! # ip-access-gate
//! ### IP access list for the sensitive locations of a multi-site web application
//!
//! An [`AccessGate`] keeps a list of permitted addresses, ranges and CIDR blocks in a
//! settings store, and denies requests to protected locations (`wp-admin`, `wp-login.php`, ...)
//! coming from addresses outside that list.

mod access_list;
mod admin;
mod gate_action;
mod gate_error;
mod location;
mod log_level;
mod logs;
mod request;
mod settings;
mod utils;

use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::warn;
use parking_lot::RwLock;

pub use crate::access_list::{is_permitted, AccessList};
pub use crate::admin::{access_list_field, AdminSubmission};
pub use crate::gate_action::GateAction;
pub use crate::gate_error::GateError;
pub use crate::location::{GateConfig, ProtectedLocation, DEFAULT_BYPASSES, DEFAULT_LOCATIONS};
pub use crate::log_level::LogLevel;
use crate::logs::log_entry::LogEntry;
use crate::logs::logger;
pub use crate::request::{Denial, DenyAction, RequestContext, DENIAL_MESSAGE, DENIAL_STATUS};
use crate::settings::is_access_list_enabled;
pub use crate::settings::{
    MemorySettings, SettingsStore, SqliteSettings, ACCESS_LIST_KEY, ENABLED_KEY,
};
pub use crate::utils::address::{
    classify, parse_v4, parse_v6, AddressFamily, Ipv4Address, Ipv6Address,
};
pub use crate::utils::cidr::in_cidr;

#[cfg(not(test))]
const LOG_DB_PATH: &str = "./access_gate.sqlite";
#[cfg(test)]
const LOG_DB_PATH: &str = "./test.sqlite";

/// Settings as last read from the store.
#[derive(Debug)]
struct Snapshot {
    enabled: bool,
    access_list: AccessList,
}

/// Object deciding whether requests to protected locations may proceed,
/// according to the access list held in a [`SettingsStore`].
///
/// Settings are read once and cached; writes made through [`AccessGate::save_settings`]
/// drop the cache before returning, so a check never sees a stale list.
/// Writes made to the store by other means must be followed by [`AccessGate::invalidate`].
pub struct AccessGate<S: SettingsStore> {
    settings: S,
    config: GateConfig,
    snapshot: RwLock<Option<Arc<Snapshot>>>,
    log_level: LogLevel,
    tx: Option<Sender<LogEntry>>,
    logger: Option<JoinHandle<()>>,
}

impl<S: SettingsStore> AccessGate<S> {
    /// Instantiates a new [`AccessGate`].
    ///
    /// # Arguments
    ///
    /// * `settings` - The store holding the enabled flag and the access list.
    ///
    /// * `config` - The protected locations; use [`GateConfig::default`] for the built-in ones.
    ///
    /// # Examples
    ///
    /// ```
    /// use ip_access_gate::{AccessGate, GateConfig, MemorySettings};
    ///
    /// let gate = AccessGate::new(MemorySettings::new(), GateConfig::default());
    /// ```
    pub fn new(settings: S, config: GateConfig) -> Self {
        let (tx, rx) = mpsc::channel();
        let logger = thread::Builder::new()
            .name("access_gate_logger".to_owned())
            .spawn(move || logger::run(&rx, LOG_DB_PATH))
            .map_err(|err| warn!("access gate decisions won't be logged: {err}"))
            .ok();

        Self {
            settings,
            config,
            snapshot: RwLock::new(None),
            log_level: LogLevel::default(),
            tx: logger.as_ref().map(|_| tx),
            logger,
        }
    }

    /// Returns the verdict for a request.
    ///
    /// The gate is inert (every request is allowed) when it is disabled or the access list is empty.
    /// Otherwise a request to a protected location is denied if its remote address
    /// is not in the access list and no bypass of that location applies.
    ///
    /// # Examples
    ///
    /// ```
    /// use ip_access_gate::{AccessGate, AdminSubmission, GateAction, GateConfig, MemorySettings, RequestContext};
    ///
    /// let gate = AccessGate::new(MemorySettings::new(), GateConfig::default());
    /// gate.save_settings(&AdminSubmission::new(Some("1"), Some("10.0.0.0/8\r\n1.1.1.1"))).unwrap();
    ///
    /// let request = RequestContext::new("/wp-admin/", Some("10.1.2.3"));
    /// assert_eq!(gate.check(&request), GateAction::Allow);
    ///
    /// let request = RequestContext::new("/wp-admin/", Some("8.8.8.8"));
    /// assert_eq!(gate.check(&request), GateAction::Deny);
    ///
    /// let request = RequestContext::new("/about-us/", Some("8.8.8.8"));
    /// assert_eq!(gate.check(&request), GateAction::Allow);
    /// ```
    #[must_use]
    pub fn check(&self, request: &RequestContext) -> GateAction {
        let snapshot = self.snapshot();
        let access_list = match &snapshot {
            Ok(snapshot) if !snapshot.enabled || snapshot.access_list.is_empty() => {
                return GateAction::Allow;
            }
            Ok(snapshot) => Some(&snapshot.access_list),
            Err(err) => {
                warn!("cannot read the access list, protected locations are closed: {err}");
                None
            }
        };

        let path = request.path();
        let mut permitted = None;
        let mut action = GateAction::Allow;
        for location in self.config.locations() {
            if !location.matches_path(path) {
                continue;
            }

            // the address is only looked up once per request
            let is_permitted = *permitted.get_or_insert_with(|| {
                access_list.is_some_and(|list| list.is_permitted_request(request))
            });

            let location_action = if is_permitted || location.is_bypassed(path) {
                GateAction::Allow
            } else {
                GateAction::Deny
            };
            if location_action == GateAction::Deny {
                action = GateAction::Deny;
            }
            self.log(request, location, location_action);
        }
        action
    }

    /// Returns the verdict for a request, invoking `deny` if the request is denied.
    ///
    /// `deny` is called at most once, with a *403* [`Denial`].
    ///
    /// # Examples
    ///
    /// ```
    /// use ip_access_gate::{AccessGate, AdminSubmission, Denial, GateConfig, MemorySettings, RequestContext};
    ///
    /// let gate = AccessGate::new(MemorySettings::new(), GateConfig::default());
    /// gate.save_settings(&AdminSubmission::new(Some("1"), Some("1.1.1.1"))).unwrap();
    ///
    /// let request = RequestContext::new("/wp-login.php", Some("2.2.2.2"));
    /// gate.enforce(&request, &|_: &RequestContext, denial: &Denial| {
    ///     assert_eq!(denial.status, 403);
    /// });
    /// ```
    pub fn enforce<D: DenyAction + ?Sized>(&self, request: &RequestContext, deny: &D) -> GateAction {
        let action = self.check(request);
        if action == GateAction::Deny {
            deny.deny(request, &Denial::default());
        }
        action
    }

    /// Checks the remote address of a request against the access list, regardless of its path.
    ///
    /// Returns `false` if the settings can't be read.
    #[must_use]
    pub fn is_in_access_list(&self, request: &RequestContext) -> bool {
        self.snapshot()
            .is_ok_and(|snapshot| snapshot.access_list.is_permitted_request(request))
    }

    /// Stores the values posted by the administrative form and drops the cached settings.
    ///
    /// # Errors
    ///
    /// Will return a [`GateError::Storage`] if the settings store can't be written.
    pub fn save_settings(&self, submission: &AdminSubmission) -> Result<(), GateError> {
        let result = submission.apply(&self.settings);
        self.invalidate();
        result
    }

    /// Drops the cached settings, so that the next check reads them again from the store.
    pub fn invalidate(&self) {
        *self.snapshot.write() = None;
    }

    /// Sets the log level for decisions taken on protected locations.
    ///
    /// Locations configured with their own `--log-level` keep it.
    ///
    /// # Examples
    ///
    /// ```
    /// use ip_access_gate::{AccessGate, GateConfig, LogLevel, MemorySettings};
    ///
    /// let mut gate = AccessGate::new(MemorySettings::new(), GateConfig::default());
    /// gate.set_log_level(LogLevel::Console);
    /// ```
    pub fn set_log_level(&mut self, log_level: LogLevel) {
        self.log_level = log_level;
    }

    #[must_use]
    pub fn settings(&self) -> &S {
        &self.settings
    }

    #[must_use]
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    fn snapshot(&self) -> Result<Arc<Snapshot>, GateError> {
        if let Some(snapshot) = self.snapshot.read().as_ref() {
            return Ok(Arc::clone(snapshot));
        }

        // loading under the write lock keeps an invalidation from being overwritten by older data
        let mut cached = self.snapshot.write();
        if let Some(snapshot) = cached.as_ref() {
            return Ok(Arc::clone(snapshot));
        }
        let snapshot = Arc::new(Snapshot {
            enabled: is_access_list_enabled(&self.settings)?,
            access_list: AccessList::parse(self.settings.get_list(ACCESS_LIST_KEY)?),
        });
        *cached = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    fn log(&self, request: &RequestContext, location: &ProtectedLocation, action: GateAction) {
        let log_level = location.log_level().unwrap_or(self.log_level);
        if log_level == LogLevel::Off {
            return;
        }
        if let Some(tx) = &self.tx {
            let entry = LogEntry::new(request, location.pattern(), action, log_level);
            if tx.send(entry).is_err() {
                warn!("the access gate logger has stopped");
            }
        }
    }
}

impl<S: SettingsStore> Drop for AccessGate<S> {
    fn drop(&mut self) {
        // closing the channel makes the logger flush and exit
        self.tx.take();
        if let Some(logger) = self.logger.take() {
            let _ = logger.join();
        }
    }
}
