use super::super::state::App;
use super::Effect;
use tracing::{debug, info};

impl App {
    pub(super) fn handle_next_chapter(&mut self, effects: &mut Vec<Effect>) {
        self.go_to_chapter(self.reader.current_chapter + 1, effects);
    }

    pub(super) fn handle_previous_chapter(&mut self, effects: &mut Vec<Effect>) {
        if let Some(previous) = self.reader.current_chapter.checked_sub(1) {
            self.go_to_chapter(previous, effects);
        }
    }

    pub(super) fn handle_toggle_toc(&mut self) {
        self.show_toc = !self.show_toc;
        debug!(visible = self.show_toc, "Toggled table of contents");
    }

    pub(super) fn handle_toc_selected(&mut self, index: usize, effects: &mut Vec<Effect>) {
        self.show_toc = false;
        self.go_to_chapter(index, effects);
    }

    fn go_to_chapter(&mut self, index: usize, effects: &mut Vec<Effect>) {
        if index == self.reader.current_chapter {
            return;
        }
        if self.load_chapter(index) {
            info!(
                chapter = index + 1,
                title = self.current_chapter_title(),
                "Navigated to chapter"
            );
            effects.push(Effect::SaveBookmark);
        }
    }
}
