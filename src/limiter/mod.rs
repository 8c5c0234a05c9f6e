//! Per-client rate limiting
//!
//! Each (client identity, route class) pair keeps a log of the instants at
//! which its requests were admitted. A request is admitted only while fewer
//! than `requests` admissions fall inside the trailing window, so no window
//! of the configured length ever holds more than the limit. Rejected
//! requests are not logged.

use crate::config::{LimitRule, LimitSettings};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Route classes with independently configured limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteClass {
    /// Every route without an override
    Default,
    /// The search proxy
    Search,
    /// Playback control endpoints
    Control,
}

impl fmt::Display for RouteClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Default => "default",
            Self::Search => "search",
            Self::Control => "control",
        };
        f.write_str(name)
    }
}

/// Outcome of a rate-limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    /// Rejected; a slot frees up after `retry_after`
    Limited { retry_after: Duration },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

type WindowKey = (String, RouteClass);

/// Sliding-window rate limiter keyed by client identity
pub struct RateLimiter {
    limits: LimitSettings,
    windows: Mutex<HashMap<WindowKey, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(limits: LimitSettings) -> Self {
        Self {
            limits,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Limit rule applied to a route class
    pub fn rule(&self, class: RouteClass) -> LimitRule {
        match class {
            RouteClass::Default => self.limits.default,
            RouteClass::Search => self.limits.search,
            RouteClass::Control => self.limits.control,
        }
    }

    /// Returns `true` if the request is admitted
    pub fn allow(&self, identity: &str, class: RouteClass) -> bool {
        self.check(identity, class).is_allowed()
    }

    /// Check and record a request made now
    pub fn check(&self, identity: &str, class: RouteClass) -> Decision {
        self.check_at(identity, class, Instant::now())
    }

    /// Check and record a request made at `now`
    pub fn check_at(&self, identity: &str, class: RouteClass, now: Instant) -> Decision {
        let rule = self.rule(class);
        let window = rule.window();

        let mut windows = self.lock();
        let log = windows
            .entry((identity.to_string(), class))
            .or_default();

        while let Some(&oldest) = log.front() {
            if now.saturating_duration_since(oldest) >= window {
                log.pop_front();
            } else {
                break;
            }
        }

        if log.len() < rule.requests as usize {
            log.push_back(now);
            return Decision::Allowed;
        }

        let retry_after = log
            .front()
            .map(|&oldest| window.saturating_sub(now.saturating_duration_since(oldest)))
            .unwrap_or(window);

        Decision::Limited { retry_after }
    }

    /// Drop identities with no admitted requests inside their window
    pub fn purge_expired(&self) {
        self.purge_expired_at(Instant::now());
    }

    pub fn purge_expired_at(&self, now: Instant) {
        let mut windows = self.lock();
        windows.retain(|(_, class), log| {
            let window = self.rule(*class).window();
            log.back()
                .is_some_and(|&newest| now.saturating_duration_since(newest) < window)
        });
    }

    /// Number of tracked (identity, class) windows
    pub fn tracked(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<WindowKey, VecDeque<Instant>>> {
        self.windows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(LimitSettings::default())
    }
}
