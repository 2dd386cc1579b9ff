use super::messages::Message;
use super::state::App;
use crate::cache::{self, Bookmark};
use iced::event;
use iced::keyboard::{self, Key, key};
use iced::mouse;
use iced::time;
use iced::window;
use iced::{Event, Subscription, Task};
use scholia_core::{RequestTicket, Selection, annotate_selection};
use std::sync::Arc;
use std::time::Duration;

mod annotation;
mod appearance;
mod navigation;
mod selection;

/// Describes work that must be performed outside the pure reducer.
pub(super) enum Effect {
    SaveBookmark,
    SavePreferences,
    ScheduleSettle(Duration),
    Annotate {
        ticket: RequestTicket,
        selection: Selection,
    },
}

impl App {
    pub fn subscription(app: &App) -> Subscription<Message> {
        let mut subscriptions = vec![event::listen_with(runtime_event_to_message)];

        if app.watcher.is_enabled() {
            subscriptions.push(
                time::every(app.config.selection.rediscover_interval())
                    .map(|_| Message::RediscoverTick),
            );
        }

        Subscription::batch(subscriptions)
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        let effects = self.reduce(message);
        if effects.is_empty() {
            Task::none()
        } else {
            Task::batch(effects.into_iter().map(|effect| self.run_effect(effect)))
        }
    }

    fn reduce(&mut self, message: Message) -> Vec<Effect> {
        let mut effects = Vec::new();

        match message {
            Message::NextChapter => self.handle_next_chapter(&mut effects),
            Message::PreviousChapter => self.handle_previous_chapter(&mut effects),
            Message::ToggleToc => self.handle_toggle_toc(),
            Message::TocSelected(index) => self.handle_toc_selected(index, &mut effects),
            Message::ToggleTheme => self.handle_toggle_theme(&mut effects),
            Message::FontSizeChanged(size) => self.handle_font_size_changed(size, &mut effects),
            Message::EditorAction(action) => self.handle_editor_action(action),
            Message::HeadingAction(action) => self.handle_heading_action(action),
            Message::PointerReleased => self.handle_pointer_released(&mut effects),
            Message::SelectionSettled => self.handle_selection_settled(),
            Message::RediscoverTick => self.handle_rediscover_tick(),
            Message::RequestAnnotation => self.handle_request_annotation(&mut effects),
            Message::AnnotationFinished { ticket, result } => {
                self.handle_annotation_finished(ticket, result)
            }
            Message::CloseAnnotation => self.handle_close_annotation(),
        }

        effects
    }

    fn run_effect(&mut self, effect: Effect) -> Task<Message> {
        match effect {
            Effect::SaveBookmark => {
                cache::save_bookmark(
                    &self.book_path,
                    Bookmark {
                        chapter: self.reader.current_chapter,
                    },
                );
                Task::none()
            }
            Effect::SavePreferences => {
                cache::save_preferences(&self.book_path, self.preferences);
                Task::none()
            }
            Effect::ScheduleSettle(delay) => {
                Task::perform(tokio::time::sleep(delay), |_| Message::SelectionSettled)
            }
            Effect::Annotate { ticket, selection } => {
                let extractor = Arc::clone(&self.extractor);
                let client = Arc::clone(&self.client);
                let policy = self.config.extraction;
                Task::perform(
                    async move { annotate_selection(&extractor, &client, &selection, policy).await },
                    move |result| Message::AnnotationFinished { ticket, result },
                )
            }
        }
    }
}

fn runtime_event_to_message(
    event: Event,
    status: event::Status,
    _window_id: window::Id,
) -> Option<Message> {
    match event {
        // The reading widget captures the release that ends a drag selection,
        // so releases are forwarded regardless of status.
        Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
            Some(Message::PointerReleased)
        }
        Event::Keyboard(keyboard::Event::KeyPressed {
            key: Key::Named(key::Named::Escape),
            ..
        }) if status == event::Status::Ignored => Some(Message::CloseAnnotation),
        _ => None,
    }
}
