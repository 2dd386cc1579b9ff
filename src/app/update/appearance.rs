use super::super::state::{App, MAX_FONT_SIZE, MIN_FONT_SIZE};
use super::Effect;
use tracing::debug;

impl App {
    pub(super) fn handle_toggle_theme(&mut self, effects: &mut Vec<Effect>) {
        self.preferences.theme = self.preferences.theme.toggled();
        debug!(theme = %self.preferences.theme, "Theme toggled");
        effects.push(Effect::SavePreferences);
    }

    pub(super) fn handle_font_size_changed(&mut self, size: u32, effects: &mut Vec<Effect>) {
        let clamped = size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        if clamped != self.preferences.font_size {
            self.preferences.font_size = clamped;
            debug!(font_size = clamped, "Font size changed");
            effects.push(Effect::SavePreferences);
        }
    }
}
