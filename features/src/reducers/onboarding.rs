//! Onboarding pager.

use crate::Dependencies;
use boardflow_core::effect::Effect;
use boardflow_core::reducer::Reducer;
use boardflow_core::{smallvec, SmallVec};

/// Number of onboarding pages.
pub const PAGE_COUNT: usize = 3;

/// Pager position and completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnboardingState {
    /// Zero-based page index
    pub current_page: usize,
    /// Number of pages
    pub total_pages: usize,
    /// Set once the last page was confirmed
    pub is_completed: bool,
    /// Whether the continue button accepts taps
    pub is_continue_enabled: bool,
}

impl Default for OnboardingState {
    fn default() -> Self {
        Self {
            current_page: 0,
            total_pages: PAGE_COUNT,
            is_completed: false,
            is_continue_enabled: true,
        }
    }
}

impl OnboardingState {
    /// Whether the pager shows its last page.
    #[must_use]
    pub const fn is_last_page(&self) -> bool {
        self.current_page + 1 >= self.total_pages
    }

    /// Fraction of pages seen, in `0.0..=1.0`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // page counts are tiny
    pub fn progress(&self) -> f64 {
        if self.total_pages == 0 {
            return 0.0;
        }
        (self.current_page + 1) as f64 / self.total_pages as f64
    }

    /// Title of the current page.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self.current_page {
            0 => "Welcome to SwiftBoard",
            1 => "Your Personal Dashboard",
            2 => "Stay Organized",
            _ => "Welcome",
        }
    }

    /// Body text of the current page.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self.current_page {
            0 => {
                "SwiftBoard helps you manage your tasks and stay organized with a beautiful, intuitive interface."
            },
            1 => "View your tasks, track your progress, and see your activity all in one place.",
            2 => "Get started by signing in to your account and begin organizing your work.",
            _ => "Welcome to SwiftBoard",
        }
    }

    /// Symbol name of the current page's icon.
    #[must_use]
    pub const fn icon(&self) -> &'static str {
        match self.current_page {
            0 => "hand.wave.fill",
            1 => "gauge.with.dots.needle.bottom.fill",
            2 => "checkmark.circle.fill",
            _ => "star.fill",
        }
    }
}

/// Onboarding input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnboardingAction {
    /// Continue button tapped
    ContinueTapped,
    /// User swiped to a page
    PageChanged(usize),
    /// The flow finished
    OnboardingCompleted,
    /// Screen shown
    OnAppear,
    /// Screen hidden
    OnDisappear,
}

/// Reducer for [`OnboardingState`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OnboardingReducer;

impl Reducer for OnboardingReducer {
    type State = OnboardingState;
    type Action = OnboardingAction;
    type Environment = Dependencies;

    fn reduce(
        &self,
        state: &mut OnboardingState,
        action: OnboardingAction,
        _env: &Dependencies,
    ) -> SmallVec<[Effect<OnboardingAction>; 4]> {
        match action {
            OnboardingAction::ContinueTapped => {
                if state.is_last_page() {
                    tracing::debug!("Onboarding finished");
                    state.is_completed = true;
                    return smallvec![Effect::send(OnboardingAction::OnboardingCompleted)];
                }
                state.current_page += 1;
            },
            OnboardingAction::PageChanged(page) => {
                if page < state.total_pages {
                    state.current_page = page;
                }
            },
            OnboardingAction::OnboardingCompleted => state.is_completed = true,
            OnboardingAction::OnAppear => {
                state.current_page = 0;
                state.is_completed = false;
                state.is_continue_enabled = true;
            },
            OnboardingAction::OnDisappear => {},
        }
        SmallVec::new()
    }
}

#[cfg(all(test, feature = "test-utils"))]
mod tests {
    use super::*;
    use boardflow_testing::{assertions, ReducerTest};

    fn at_page(page: usize) -> OnboardingState {
        OnboardingState {
            current_page: page,
            ..OnboardingState::default()
        }
    }

    #[test]
    fn initial_state() {
        let state = OnboardingState::default();
        assert_eq!(state.current_page, 0);
        assert_eq!(state.total_pages, 3);
        assert!(!state.is_completed);
        assert!(state.is_continue_enabled);
        assert!(!state.is_last_page());
        assert!((state.progress() - 1.0 / 3.0).abs() < 0.01);
    }

    #[test]
    fn continue_advances() {
        ReducerTest::new(OnboardingReducer)
            .with_env(Dependencies::mock())
            .given_state(OnboardingState::default())
            .when_action(OnboardingAction::ContinueTapped)
            .then_state(|state| {
                assert_eq!(state.current_page, 1);
                assert!(!state.is_completed);
            })
            .then_effects(|effects| assertions::assert_effects_count(effects, 0))
            .run();
    }

    #[test]
    fn continue_on_last_page_completes() {
        let mut state = at_page(2);
        let effects = OnboardingReducer.reduce(
            &mut state,
            OnboardingAction::ContinueTapped,
            &Dependencies::mock(),
        );

        assert!(state.is_completed);
        assert_eq!(state.current_page, 2);
        assertions::assert_sends(effects.into_vec(), &[OnboardingAction::OnboardingCompleted]);
    }

    #[test]
    fn page_changes_are_bounded() {
        ReducerTest::new(OnboardingReducer)
            .with_env(Dependencies::mock())
            .given_state(at_page(1))
            .when_actions([OnboardingAction::PageChanged(5), OnboardingAction::PageChanged(2)])
            .then_state(|state| assert_eq!(state.current_page, 2))
            .then_effects(|effects| assertions::assert_effects_count(effects, 0))
            .run();

        ReducerTest::new(OnboardingReducer)
            .with_env(Dependencies::mock())
            .given_state(at_page(1))
            .when_action(OnboardingAction::PageChanged(3))
            .then_state(|state| assert_eq!(state.current_page, 1))
            .run();
    }

    #[test]
    fn on_appear_resets() {
        let state = OnboardingState {
            current_page: 2,
            is_completed: true,
            is_continue_enabled: false,
            ..OnboardingState::default()
        };
        ReducerTest::new(OnboardingReducer)
            .with_env(Dependencies::mock())
            .given_state(state)
            .when_action(OnboardingAction::OnAppear)
            .then_state(|state| assert_eq!(*state, OnboardingState::default()))
            .run();
    }

    #[test]
    fn page_content() {
        let pages: Vec<_> = (0..3).map(at_page).collect();
        assert_eq!(pages[0].title(), "Welcome to SwiftBoard");
        assert_eq!(pages[0].icon(), "hand.wave.fill");
        assert_eq!(pages[1].title(), "Your Personal Dashboard");
        assert_eq!(
            pages[1].description(),
            "View your tasks, track your progress, and see your activity all in one place."
        );
        assert_eq!(pages[2].title(), "Stay Organized");
        assert_eq!(pages[2].icon(), "checkmark.circle.fill");
        assert!(pages[2].is_last_page());
        assert!((pages[1].progress() - 2.0 / 3.0).abs() < 0.01);
        assert!((pages[2].progress() - 1.0).abs() < 0.01);
    }
}
