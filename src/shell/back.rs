use std::time::{Duration, Instant};

use crate::route::RouteInfo;

/// What a hardware back press resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackDecision {
    /// Step back in the content's own history.
    DelegateToContent,
    /// Reset the content to home.
    NavigateHome,
    /// First press on home: show "press again to exit".
    ShowExitNotice,
    /// Second press within the exit window.
    ExitApp,
    /// Engine disabled; let the platform handle the press.
    PlatformDefault,
}

impl BackDecision {
    /// Whether the platform's default back behavior must be suppressed.
    #[must_use]
    pub fn consumes_event(self) -> bool {
        !matches!(self, Self::PlatformDefault)
    }
}

/// Back-press state machine.
///
/// Rules, first match wins:
///
/// | Route | Decision |
/// |-------|----------|
/// | nested page with history | [`BackDecision::DelegateToContent`] |
/// | tab root other than home | [`BackDecision::NavigateHome`] |
/// | anything else | double press to exit |
#[derive(Debug)]
pub struct BackNavigator {
    enabled: bool,
    exit_window: Duration,
    route: RouteInfo,
    last_press: Option<Instant>,
}

impl BackNavigator {
    #[must_use]
    pub fn new(enabled: bool, exit_window: Duration) -> Self {
        Self {
            enabled,
            exit_window,
            route: RouteInfo::default(),
            last_press: None,
        }
    }

    #[must_use]
    pub fn route(&self) -> &RouteInfo {
        &self.route
    }

    pub fn set_route(&mut self, route: RouteInfo) {
        self.route = route;
    }

    pub fn on_back_press(&mut self, now: Instant) -> BackDecision {
        if !self.enabled {
            return BackDecision::PlatformDefault;
        }

        let route = &self.route;
        if !route.is_tab_route && route.can_go_back {
            return BackDecision::DelegateToContent;
        }
        if route.is_tab_route && !route.is_home {
            return BackDecision::NavigateHome;
        }

        let within_window = self
            .last_press
            .is_some_and(|last| now.saturating_duration_since(last) <= self.exit_window);
        if within_window {
            self.last_press = None;
            BackDecision::ExitApp
        } else {
            self.last_press = Some(now);
            BackDecision::ShowExitNotice
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn navigator_on(route: RouteInfo) -> BackNavigator {
        let mut nav = BackNavigator::new(true, Duration::from_secs(2));
        nav.set_route(route);
        nav
    }

    fn route(path: &str, is_tab_route: bool, is_home: bool, can_go_back: bool) -> RouteInfo {
        RouteInfo {
            path: path.into(),
            is_tab_route,
            is_home,
            can_go_back,
        }
    }

    #[test]
    fn nested_page_with_history_delegates() {
        let mut nav = navigator_on(route("/chat/42", false, false, true));
        let decision = nav.on_back_press(Instant::now());
        assert_eq!(decision, BackDecision::DelegateToContent);
        assert!(decision.consumes_event());
    }

    #[test]
    fn tab_root_goes_home_regardless_of_history() {
        for can_go_back in [true, false] {
            let mut nav = navigator_on(route("/chat", true, false, can_go_back));
            assert_eq!(nav.on_back_press(Instant::now()), BackDecision::NavigateHome);
        }
    }

    #[test]
    fn first_press_on_home_shows_notice() {
        let mut nav = navigator_on(RouteInfo::default());
        assert_eq!(nav.on_back_press(Instant::now()), BackDecision::ShowExitNotice);
    }

    #[test]
    fn second_press_within_window_exits() {
        let mut nav = navigator_on(RouteInfo::default());
        let start = Instant::now();
        nav.on_back_press(start);
        assert_eq!(
            nav.on_back_press(start + Duration::from_millis(1500)),
            BackDecision::ExitApp
        );
    }

    #[test]
    fn second_press_after_window_shows_notice_again() {
        let mut nav = navigator_on(RouteInfo::default());
        let start = Instant::now();
        nav.on_back_press(start);
        let later = start + Duration::from_millis(2500);
        assert_eq!(nav.on_back_press(later), BackDecision::ShowExitNotice);
        assert_eq!(
            nav.on_back_press(later + Duration::from_millis(100)),
            BackDecision::ExitApp
        );
    }

    #[test]
    fn nested_page_without_history_falls_through_to_exit_rule() {
        let mut nav = navigator_on(route("/login", false, false, false));
        assert_eq!(nav.on_back_press(Instant::now()), BackDecision::ShowExitNotice);
    }

    #[test]
    fn disabled_engine_defers_to_platform() {
        let mut nav = BackNavigator::new(false, Duration::from_secs(2));
        nav.set_route(route("/chat/42", false, false, true));
        let decision = nav.on_back_press(Instant::now());
        assert_eq!(decision, BackDecision::PlatformDefault);
        assert!(!decision.consumes_event());
    }
}
