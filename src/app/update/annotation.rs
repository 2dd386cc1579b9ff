use super::super::state::App;
use super::Effect;
use scholia_core::{AnnotateError, AnnotationResult, RequestTicket};
use tracing::debug;

impl App {
    pub(super) fn handle_request_annotation(&mut self, effects: &mut Vec<Effect>) {
        let Some(selection) = self.watcher.current_selection() else {
            debug!("Annotation requested without a selection");
            return;
        };
        let configured = self.config.annotation.is_configured();
        if let Some(ticket) = self.session.begin(&selection, configured) {
            effects.push(Effect::Annotate { ticket, selection });
        }
    }

    pub(super) fn handle_annotation_finished(
        &mut self,
        ticket: RequestTicket,
        result: Result<AnnotationResult, AnnotateError>,
    ) {
        self.session.settle(ticket, result);
    }

    pub(super) fn handle_close_annotation(&mut self) {
        if !self.session.is_visible() {
            return;
        }
        self.session.close();
        self.clear_selection();
    }
}
