use super::super::state::App;
use super::Effect;
use iced::widget::text_editor::{Action, Motion};
use scholia_core::DocumentSurface;
use std::time::Instant;
use tracing::{trace, warn};

impl App {
    /// The chapter view is read-only: edits are dropped, everything else
    /// (cursor moves, drags, scrolling) goes through and may change the
    /// native selection.
    pub(super) fn handle_editor_action(&mut self, action: Action) {
        if action.is_edit() {
            trace!("Ignoring edit on read-only chapter view");
            return;
        }
        self.reader.content.perform(action);
        self.mirror_editor_selection();
    }

    /// Same read-only rules as the chapter view. The heading belongs to the
    /// host surface, which the watcher only reads when the chapter has no
    /// selection.
    pub(super) fn handle_heading_action(&mut self, action: Action) {
        if action.is_edit() {
            trace!("Ignoring edit on read-only heading");
            return;
        }
        self.reader.heading.perform(action);
        if let Err(err) = self
            .host
            .mirror_native_selection(self.reader.heading.selection())
        {
            warn!("Could not mirror selection into host surface: {err}");
            return;
        }
        self.watcher.refresh(&self.page);
    }

    pub(super) fn handle_pointer_released(&mut self, effects: &mut Vec<Effect>) {
        if let Some(delay) = self.watcher.on_pointer_release(Instant::now()) {
            effects.push(Effect::ScheduleSettle(delay));
        }
    }

    pub(super) fn handle_selection_settled(&mut self) {
        self.watcher.settle(Instant::now(), &self.page);
    }

    pub(super) fn handle_rediscover_tick(&mut self) {
        self.watcher.rediscover(&self.page);
    }

    /// Collapse the widget's selection and clear it everywhere else.
    pub(super) fn clear_selection(&mut self) {
        self.reader.content.perform(Action::Move(Motion::Left));
        self.reader.heading.perform(Action::Move(Motion::Left));
        self.watcher.clear(&self.page);
    }

    fn mirror_editor_selection(&mut self) {
        let selected = self.reader.content.selection();
        if let Err(err) = self.reader.surface.mirror_native_selection(selected) {
            warn!("Could not mirror selection into chapter surface: {err}");
            return;
        }
        self.watcher
            .on_selection_change(self.reader.surface.id(), &self.page);
    }
}
