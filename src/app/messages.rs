use iced::widget::text_editor;
use scholia_core::{AnnotateError, AnnotationResult, RequestTicket};

/// Messages emitted by the UI.
#[derive(Debug, Clone)]
pub enum Message {
    NextChapter,
    PreviousChapter,
    ToggleToc,
    TocSelected(usize),
    ToggleTheme,
    FontSizeChanged(u32),
    EditorAction(text_editor::Action),
    HeadingAction(text_editor::Action),
    PointerReleased,
    SelectionSettled,
    RediscoverTick,
    RequestAnnotation,
    AnnotationFinished {
        ticket: RequestTicket,
        result: Result<AnnotationResult, AnnotateError>,
    },
    CloseAnnotation,
}
