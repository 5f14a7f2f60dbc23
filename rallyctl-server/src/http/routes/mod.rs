//! Route handlers organized by resource

pub mod api;
pub mod cars;
pub mod health;
pub mod race;
pub mod races;
pub mod teams;

use serde::Deserialize;

/// `?notice=` carried across a Post/Redirect/Get round trip
#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
    pub notice: Option<String>,
    pub warning: Option<String>,
}

impl NoticeQuery {
    pub fn banner(&self) -> Option<super::views::Banner> {
        use super::views::Banner;

        self.warning
            .as_deref()
            .map(Banner::warning)
            .or_else(|| self.notice.as_deref().map(Banner::success))
    }
}

/// Redirect target with a success notice
pub(crate) fn with_notice(path: &str, notice: &str) -> String {
    format!("{path}?notice={}", urlencoding::encode(notice))
}

/// Redirect target with a warning
pub(crate) fn with_warning(path: &str, warning: &str) -> String {
    format!("{path}?warning={}", urlencoding::encode(warning))
}
