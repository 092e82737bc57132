use crate::icons::IconImage;

/// Window-level requests coming from the tray thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserEvent {
    Show,
    Hide,
    Toggle,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconRequest {
    pub key: String,
    pub name_hint: Option<String>,
    pub size: u32,
}

#[derive(Debug, Clone)]
pub struct IconResult {
    pub key: String,
    pub image: Option<IconImage>,
}
