// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::query::{ParameterKind, QueryKind, QueryRequest};

const ALREADY_RUNNING: &str = "query already running";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryPhase {
    Idle,
    Prompting,
    Fetching,
    Rendered,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub selected: QueryKind,
    pub phase: QueryPhase,
    pub input: String,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            selected: QueryKind::AllDevices,
            phase: QueryPhase::Idle,
            input: String::new(),
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    SelectNext,
    SelectPrev,
    Start,
    InputChar(char),
    InputBackspace,
    Submit,
    CancelInput,
    FetchFinished,
    Reset,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    SelectionChanged(QueryKind),
    PhaseChanged(QueryPhase),
    InputChanged(String),
    FetchRequested(QueryRequest),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::SelectNext => self.rotate_selection(1),
            AppCommand::SelectPrev => self.rotate_selection(-1),
            AppCommand::Start => self.start(),
            AppCommand::InputChar(ch) => {
                if self.phase != QueryPhase::Prompting || ch.is_control() {
                    return Vec::new();
                }
                self.input.push(ch);
                vec![AppEvent::InputChanged(self.input.clone())]
            }
            AppCommand::InputBackspace => {
                if self.phase != QueryPhase::Prompting || self.input.pop().is_none() {
                    return Vec::new();
                }
                vec![AppEvent::InputChanged(self.input.clone())]
            }
            AppCommand::Submit => self.submit(),
            AppCommand::CancelInput => {
                if self.phase != QueryPhase::Prompting {
                    return Vec::new();
                }
                self.input.clear();
                vec![self.set_phase(QueryPhase::Idle), self.set_status("input canceled")]
            }
            AppCommand::FetchFinished => {
                if self.phase != QueryPhase::Fetching {
                    return Vec::new();
                }
                vec![self.set_phase(QueryPhase::Rendered)]
            }
            AppCommand::Reset => match self.phase {
                QueryPhase::Rendered => vec![self.set_phase(QueryPhase::Idle)],
                QueryPhase::Idle | QueryPhase::Prompting | QueryPhase::Fetching => Vec::new(),
            },
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    pub fn prompt(&self) -> Option<ParameterKind> {
        if self.phase == QueryPhase::Prompting {
            self.selected.parameter()
        } else {
            None
        }
    }

    pub fn is_busy(&self) -> bool {
        self.phase == QueryPhase::Fetching
    }

    fn start(&mut self) -> Vec<AppEvent> {
        match self.phase {
            QueryPhase::Fetching => return vec![self.set_status(ALREADY_RUNNING)],
            QueryPhase::Prompting => return self.submit(),
            QueryPhase::Idle | QueryPhase::Rendered => {}
        }

        if self.selected.parameter().is_some() {
            self.input.clear();
            return vec![self.set_phase(QueryPhase::Prompting)];
        }

        match QueryRequest::from_input(self.selected, "") {
            Ok(request) => self.begin_fetch(request),
            Err(message) => vec![self.set_status(&message)],
        }
    }

    fn submit(&mut self) -> Vec<AppEvent> {
        match self.phase {
            QueryPhase::Fetching => return vec![self.set_status(ALREADY_RUNNING)],
            QueryPhase::Prompting => {}
            QueryPhase::Idle | QueryPhase::Rendered => return Vec::new(),
        }

        match QueryRequest::from_input(self.selected, &self.input) {
            Ok(request) => self.begin_fetch(request),
            Err(message) => vec![self.set_status(&message)],
        }
    }

    fn begin_fetch(&mut self, request: QueryRequest) -> Vec<AppEvent> {
        vec![
            self.set_phase(QueryPhase::Fetching),
            AppEvent::FetchRequested(request),
        ]
    }

    fn rotate_selection(&mut self, delta: isize) -> Vec<AppEvent> {
        if matches!(self.phase, QueryPhase::Prompting | QueryPhase::Fetching) {
            return Vec::new();
        }
        let kinds = QueryKind::ALL;
        let current = kinds
            .iter()
            .position(|kind| *kind == self.selected)
            .unwrap_or(0) as isize;
        let len = kinds.len() as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.selected = kinds[next];
        vec![AppEvent::SelectionChanged(self.selected)]
    }

    fn set_phase(&mut self, phase: QueryPhase) -> AppEvent {
        self.phase = phase;
        AppEvent::PhaseChanged(phase)
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::{AppCommand, AppEvent, AppState, QueryPhase};
    use crate::{DeviceId, QueryKind, QueryRequest};

    fn fetch_requests(events: &[AppEvent]) -> Vec<QueryRequest> {
        events
            .iter()
            .filter_map(|event| match event {
                AppEvent::FetchRequested(request) => Some(request.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn selection_rotation_wraps() {
        let mut state = AppState {
            selected: QueryKind::RackDevices,
            ..AppState::default()
        };

        let events = state.dispatch(AppCommand::SelectNext);
        assert_eq!(state.selected, QueryKind::AllDevices);
        assert_eq!(events, vec![AppEvent::SelectionChanged(QueryKind::AllDevices)]);

        state.dispatch(AppCommand::SelectPrev);
        assert_eq!(state.selected, QueryKind::RackDevices);
    }

    #[test]
    fn start_on_plain_query_goes_straight_to_fetching() {
        let mut state = AppState::default();

        let events = state.dispatch(AppCommand::Start);
        assert_eq!(state.phase, QueryPhase::Fetching);
        assert_eq!(
            events,
            vec![
                AppEvent::PhaseChanged(QueryPhase::Fetching),
                AppEvent::FetchRequested(QueryRequest::AllDevices),
            ]
        );

        state.dispatch(AppCommand::FetchFinished);
        assert_eq!(state.phase, QueryPhase::Rendered);

        state.dispatch(AppCommand::Reset);
        assert_eq!(state.phase, QueryPhase::Idle);
    }

    #[test]
    fn second_trigger_while_fetching_is_rejected() {
        let mut state = AppState {
            selected: QueryKind::AllInterfaces,
            ..AppState::default()
        };

        let first = state.dispatch(AppCommand::Start);
        assert_eq!(fetch_requests(&first), vec![QueryRequest::AllInterfaces]);

        let second = state.dispatch(AppCommand::Start);
        assert!(fetch_requests(&second).is_empty());
        assert_eq!(state.status_line.as_deref(), Some("query already running"));
        assert_eq!(state.phase, QueryPhase::Fetching);

        let submit = state.dispatch(AppCommand::Submit);
        assert!(fetch_requests(&submit).is_empty());

        let moved = state.dispatch(AppCommand::SelectNext);
        assert!(moved.is_empty());
        assert_eq!(state.selected, QueryKind::AllInterfaces);
    }

    #[test]
    fn parameterized_query_prompts_then_submits() {
        let mut state = AppState {
            selected: QueryKind::DeviceInterfaces,
            ..AppState::default()
        };

        let events = state.dispatch(AppCommand::Start);
        assert_eq!(events, vec![AppEvent::PhaseChanged(QueryPhase::Prompting)]);
        assert!(state.prompt().is_some());

        state.dispatch(AppCommand::InputChar('4'));
        state.dispatch(AppCommand::InputChar('2'));
        state.dispatch(AppCommand::InputChar('9'));
        state.dispatch(AppCommand::InputBackspace);
        assert_eq!(state.input, "42");

        let submitted = state.dispatch(AppCommand::Submit);
        assert_eq!(
            fetch_requests(&submitted),
            vec![QueryRequest::DeviceInterfaces {
                device_id: DeviceId::new(42)
            }]
        );
        assert_eq!(state.phase, QueryPhase::Fetching);
        assert!(state.prompt().is_none());
    }

    #[test]
    fn blank_submit_keeps_prompt_open_with_status() {
        let mut state = AppState {
            selected: QueryKind::RackDevices,
            ..AppState::default()
        };
        state.dispatch(AppCommand::Start);

        let events = state.dispatch(AppCommand::Submit);
        assert_eq!(
            events,
            vec![AppEvent::StatusUpdated("enter a Rack Name".to_owned())]
        );
        assert_eq!(state.phase, QueryPhase::Prompting);
    }

    #[test]
    fn cancel_input_returns_to_idle_and_clears_buffer() {
        let mut state = AppState {
            selected: QueryKind::RackDevices,
            ..AppState::default()
        };
        state.dispatch(AppCommand::Start);
        state.dispatch(AppCommand::InputChar('R'));

        state.dispatch(AppCommand::CancelInput);
        assert_eq!(state.phase, QueryPhase::Idle);
        assert!(state.input.is_empty());
        assert_eq!(state.status_line.as_deref(), Some("input canceled"));
    }

    #[test]
    fn input_is_ignored_outside_prompt() {
        let mut state = AppState::default();
        assert!(state.dispatch(AppCommand::InputChar('x')).is_empty());
        assert!(state.dispatch(AppCommand::InputBackspace).is_empty());
        assert!(state.dispatch(AppCommand::FetchFinished).is_empty());
        assert!(state.input.is_empty());
    }

    #[test]
    fn start_from_rendered_runs_the_next_query() {
        let mut state = AppState {
            phase: QueryPhase::Rendered,
            ..AppState::default()
        };
        let events = state.dispatch(AppCommand::Start);
        assert_eq!(fetch_requests(&events), vec![QueryRequest::AllDevices]);
    }

    #[test]
    fn clear_status_drops_line() {
        let mut state = AppState::default();
        state.dispatch(AppCommand::SetStatus("hello".to_owned()));
        assert_eq!(state.status_line.as_deref(), Some("hello"));
        assert_eq!(
            state.dispatch(AppCommand::ClearStatus),
            vec![AppEvent::StatusCleared]
        );
        assert!(state.status_line.is_none());
    }
}
