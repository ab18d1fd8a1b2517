//! crates/recitation_core/src/template.rs
//!
//! The session template: which prayer sessions are scheduled, in what fixed order,
//! and how many recitations each one needs.

use serde::{Deserialize, Serialize};

use crate::domain::{Session, SessionCategory};

/// Persisted per-session settings, merged onto the default catalog on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOverride {
    pub id: String,
    pub enabled: bool,
    pub total_units: u32,
    #[serde(default)]
    pub recitation_units: Option<u32>,
}

/// Ordered list of sessions. Sessions are never deleted, only disabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<SessionOverride>", into = "Vec<SessionOverride>")]
pub struct SessionTemplate {
    sessions: Vec<Session>,
}

#[allow(clippy::too_many_arguments)]
fn session(
    id: &str,
    name: &str,
    order: u32,
    category: SessionCategory,
    enabled: bool,
    total_units: u32,
    recitation_units: Option<u32>,
    (min_units, max_units): (u32, u32),
    must_be_odd: bool,
) -> Session {
    Session {
        id: id.to_string(),
        name: name.to_string(),
        order,
        category,
        enabled,
        total_units,
        recitation_units,
        min_units,
        max_units,
        must_be_odd,
    }
}

/// The built-in session catalog every template starts from.
pub fn default_sessions() -> Vec<Session> {
    use SessionCategory::{Main, Sunnah};
    vec![
        session("tahajud", "Tahajud", 1, Sunnah, true, 4, None, (2, 12), false),
        session("witir", "Witir", 2, Sunnah, true, 3, None, (1, 11), true),
        session("subuh", "Subuh", 3, Main, false, 2, None, (2, 2), false),
        session("syuruq", "Syuruq", 4, Sunnah, false, 2, None, (2, 4), false),
        session("dhuha", "Dhuha", 5, Sunnah, true, 4, None, (2, 12), false),
        session("dzuhur", "Dzuhur", 6, Main, false, 4, Some(2), (4, 4), false),
        session("ashar", "Ashar", 7, Main, false, 4, Some(2), (4, 4), false),
        session("maghrib", "Maghrib", 8, Main, false, 3, Some(2), (3, 3), false),
        session("isya", "Isya", 9, Main, false, 4, Some(2), (4, 4), false),
    ]
}

/// The default catalog's session, if `id` names one.
pub fn default_session(id: &str) -> Option<Session> {
    default_sessions().into_iter().find(|s| s.id == id)
}

/// Clamps `requested` into `[min, max]` and, for odd-only sessions, moves an even
/// result to the nearest odd value in the direction of the adjustment.
pub fn adjust_units(current: u32, requested: u32, min: u32, max: u32, must_be_odd: bool) -> u32 {
    let (min, max) = (min.min(max), max.max(min));
    let value = requested.clamp(min, max);
    if !must_be_odd || value % 2 == 1 {
        return value;
    }

    let valid = |v: u32| (min..=max).contains(&v) && v % 2 == 1;
    let up = value + 1;
    let down = value.saturating_sub(1);
    let (preferred, fallback) = if requested >= current {
        (up, down)
    } else {
        (down, up)
    };
    if valid(preferred) {
        preferred
    } else if valid(fallback) {
        fallback
    } else {
        value
    }
}

impl SessionTemplate {
    pub fn new(mut sessions: Vec<Session>) -> Self {
        sessions.sort_by_key(|s| s.order);
        Self { sessions }
    }

    /// Applies persisted overrides to the default catalog. Unknown ids are ignored and
    /// new catalog sessions keep their defaults.
    pub fn from_overrides(overrides: &[SessionOverride]) -> Self {
        let sessions = default_sessions()
            .into_iter()
            .map(|mut session| {
                if let Some(o) = overrides.iter().find(|o| o.id == session.id) {
                    session.enabled = o.enabled;
                    session.total_units = adjust_units(
                        session.total_units,
                        o.total_units,
                        session.min_units,
                        session.max_units,
                        session.must_be_odd,
                    );
                    session.recitation_units = o
                        .recitation_units
                        .or(session.recitation_units)
                        .map(|r| r.min(session.total_units));
                }
                session
            })
            .collect();
        Self::new(sessions)
    }

    pub fn overrides(&self) -> Vec<SessionOverride> {
        self.sessions
            .iter()
            .map(|s| SessionOverride {
                id: s.id.clone(),
                enabled: s.enabled,
                total_units: s.total_units,
                recitation_units: s.recitation_units,
            })
            .collect()
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Flips a session's enabled flag. Returns the resulting flag, or `None` for an
    /// unknown id.
    pub fn toggle_enabled(&mut self, id: &str) -> Option<bool> {
        let session = self.sessions.iter_mut().find(|s| s.id == id)?;
        session.enabled = !session.enabled;
        Some(session.enabled)
    }

    /// Sets a session's unit count, correcting it into the session's bounds rather
    /// than rejecting it. Returns the stored count, or `None` for an unknown id.
    pub fn set_recitation_count(&mut self, id: &str, count: u32) -> Option<u32> {
        let session = self.sessions.iter_mut().find(|s| s.id == id)?;
        let total = adjust_units(
            session.total_units,
            count,
            session.min_units,
            session.max_units,
            session.must_be_odd,
        );
        session.total_units = total;
        if let Some(recitation) = session.recitation_units {
            session.recitation_units = Some(recitation.min(total));
        }
        Some(total)
    }

    pub fn enabled_sessions_in_order(&self) -> Vec<&Session> {
        let mut enabled: Vec<&Session> = self.sessions.iter().filter(|s| s.enabled).collect();
        enabled.sort_by_key(|s| s.order);
        enabled
    }

    /// Recitations needed across all enabled sessions.
    pub fn total_required_units(&self) -> u32 {
        self.sessions
            .iter()
            .filter(|s| s.enabled)
            .map(Session::recitation_count)
            .sum()
    }

    /// Order of a session for sorting assignments: the template's own order, then
    /// the default catalog's, then last.
    pub fn order_of(&self, id: &str) -> u32 {
        self.get(id)
            .map(|s| s.order)
            .or_else(|| default_session(id).map(|s| s.order))
            .unwrap_or(u32::MAX)
    }
}

impl Default for SessionTemplate {
    fn default() -> Self {
        Self::new(default_sessions())
    }
}

impl From<Vec<SessionOverride>> for SessionTemplate {
    fn from(overrides: Vec<SessionOverride>) -> Self {
        Self::from_overrides(&overrides)
    }
}

impl From<SessionTemplate> for Vec<SessionOverride> {
    fn from(template: SessionTemplate) -> Self {
        template.overrides()
    }
}
