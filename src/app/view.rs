use super::messages::Message;
use super::state::{App, MAX_FONT_SIZE, MIN_FONT_SIZE};
use crate::config::ThemeMode;
use iced::alignment::Vertical;
use iced::font::{self, Font};
use iced::widget::text::LineHeight;
use iced::widget::{
    Column, Row, button, center, column, container, horizontal_space, mouse_area, opaque, row,
    scrollable, slider, stack, text, text_editor,
};
use iced::{Color, Element, Length, Padding};
use scholia_core::{AnnotationOutcome, AnnotationResult};

const HEADING_WIDTH: f32 = 320.0;
const TOC_WIDTH: f32 = 280.0;
const TOC_INDENT: f32 = 16.0;
const PANEL_WIDTH: f32 = 560.0;
const PANEL_MAX_HEIGHT: f32 = 620.0;

impl App {
    pub fn view(&self) -> Element<'_, Message> {
        let total = self.chapter_count().max(1);
        let current = self.reader.current_chapter;
        let chapter_label = format!("({} of {})", current + 1, total);
        let heading = container(
            text_editor(&self.reader.heading)
                .on_action(Message::HeadingAction)
                .padding(4),
        )
        .width(Length::Fixed(HEADING_WIDTH));

        let prev_button = if current > 0 {
            button("Previous").on_press(Message::PreviousChapter)
        } else {
            button("Previous")
        };
        let next_button = if current + 1 < total {
            button("Next").on_press(Message::NextChapter)
        } else {
            button("Next")
        };

        let toc_toggle = button(if self.show_toc { "Hide Contents" } else { "Contents" })
            .on_press(Message::ToggleToc);
        let theme_toggle = button(match self.preferences.theme {
            ThemeMode::Night => "Day Mode",
            ThemeMode::Day => "Night Mode",
        })
        .on_press(Message::ToggleTheme);

        let ai_button = if self.watcher.current_selection().is_some() {
            button("AI Context").on_press(Message::RequestAnnotation)
        } else {
            button("AI Context")
        };

        let font_control = column![
            text(format!("Font: {}", self.preferences.font_size)),
            slider(
                MIN_FONT_SIZE as f32..=MAX_FONT_SIZE as f32,
                self.preferences.font_size as f32,
                |value| Message::FontSizeChanged(value.round() as u32),
            )
            .width(Length::Fixed(160.0))
        ]
        .spacing(4);

        let controls = row![
            prev_button,
            next_button,
            heading,
            text(chapter_label),
            horizontal_space(),
            font_control,
            toc_toggle,
            theme_toggle,
            ai_button,
        ]
        .spacing(10)
        .align_y(Vertical::Center)
        .width(Length::Fill);

        let chapter_view = text_editor(&self.reader.content)
            .on_action(Message::EditorAction)
            .size(self.preferences.font_size as f32)
            .line_height(LineHeight::Relative(self.config.appearance.line_spacing))
            .padding(24)
            .height(Length::Fill);

        let content: Column<'_, Message> = column![controls, chapter_view]
            .padding(16)
            .spacing(12)
            .height(Length::Fill);

        let mut layout: Row<'_, Message> = row![container(content).width(Length::Fill)].spacing(8);
        if self.show_toc {
            layout = layout.push(self.toc_panel());
        }

        if self.session.is_visible() {
            modal(layout, self.annotation_panel(), Message::CloseAnnotation)
        } else {
            layout.into()
        }
    }
}

impl App {
    fn toc_panel(&self) -> Element<'_, Message> {
        let mut entries: Column<'_, Message> = column![].spacing(2);

        if self.book.toc.is_empty() {
            for (index, chapter) in self.book.chapters.iter().enumerate() {
                entries = entries.push(
                    button(text(chapter.title.as_str()))
                        .style(button::text)
                        .on_press(Message::TocSelected(index)),
                );
            }
        } else {
            for entry in &self.book.toc {
                let mut item = button(text(entry.label.as_str())).style(button::text);
                if let Some(index) = entry.chapter {
                    item = item.on_press(Message::TocSelected(index));
                }
                entries = entries.push(container(item).padding(Padding {
                    left: entry.depth as f32 * TOC_INDENT,
                    ..Padding::ZERO
                }));
            }
        }

        container(scrollable(entries).height(Length::Fill))
            .width(Length::Fixed(TOC_WIDTH))
            .padding(16)
            .into()
    }

    fn annotation_panel(&self) -> Element<'_, Message> {
        let header = row![
            text("AI Context Analysis").size(22),
            horizontal_space(),
            button("Close").on_press(Message::CloseAnnotation),
        ]
        .align_y(Vertical::Center);

        let mut body: Column<'_, Message> = column![
            section_title("Selected Text"),
            text(format!("\"{}\"", self.session.selected_text().unwrap_or_default())),
        ]
        .spacing(10);

        match self.session.outcome() {
            Some(AnnotationOutcome::Pending) => {
                body = body.push(text("Analyzing with AI..."));
            }
            Some(AnnotationOutcome::Failure(message)) => {
                body = body.push(text(message.as_str()).style(text::danger));
            }
            Some(AnnotationOutcome::Success(result)) => {
                body = body.push(result_sections(result));
            }
            None => {}
        }

        container(column![header, scrollable(body)].spacing(16))
            .width(Length::Fixed(PANEL_WIDTH))
            .max_height(PANEL_MAX_HEIGHT)
            .padding(20)
            .style(container::rounded_box)
            .into()
    }
}

/// Scene, location and background always show; characters and key terms
/// only when the model named some.
fn result_sections(result: &AnnotationResult) -> Element<'_, Message> {
    let mut sections: Column<'_, Message> = column![
        section_title("Current Scene"),
        text(result.current_scene.as_str()),
    ]
    .spacing(8);

    if !result.characters.is_empty() {
        sections = sections
            .push(section_title("Characters"))
            .push(tags(&result.characters));
    }

    sections = sections
        .push(section_title("Location"))
        .push(text(result.location.as_str()));

    if !result.key_terms.is_empty() {
        sections = sections
            .push(section_title("Key Terms"))
            .push(tags(&result.key_terms));
    }

    sections
        .push(section_title("Background"))
        .push(text(result.background.as_str()))
        .into()
}

fn section_title(label: &str) -> Element<'_, Message> {
    text(label)
        .size(16)
        .font(Font {
            weight: font::Weight::Bold,
            ..Font::DEFAULT
        })
        .into()
}

fn tags(items: &[String]) -> Element<'_, Message> {
    Row::with_children(items.iter().map(|item| {
        container(text(item.as_str()))
            .padding([4, 10])
            .style(container::rounded_box)
            .into()
    }))
    .spacing(6)
    .wrap()
    .into()
}

fn modal<'a>(
    base: impl Into<Element<'a, Message>>,
    content: impl Into<Element<'a, Message>>,
    on_blur: Message,
) -> Element<'a, Message> {
    stack![
        base.into(),
        opaque(
            mouse_area(center(opaque(content)).style(|_theme| {
                container::Style {
                    background: Some(
                        Color {
                            a: 0.7,
                            ..Color::BLACK
                        }
                        .into(),
                    ),
                    ..container::Style::default()
                }
            }))
            .on_press(on_blur)
        )
    ]
    .into()
}
