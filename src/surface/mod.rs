//! Rendering surface: a page of named containers.
//!
//! A container is the area a widget or batch controller draws into. The page
//! keeps every attached container by id so the web layer can compose HTML and
//! route interactions. Each container is written by exactly one owner.

mod view;

pub use view::*;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

/// What a container currently shows.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Content {
    #[default]
    Empty,
    Placeholder(Placeholder),
    Widget(WidgetView),
    /// Ordered ids of child containers (batch mode).
    Children(Vec<String>),
}

#[derive(Debug)]
struct Container {
    /// Measured width in pixels; zero or less means "not laid out".
    width_px: i64,
    content: Content,
    attached: bool,
}

/// Handle to one container, held by its owner.
#[derive(Debug, Clone)]
pub struct Surface {
    id: String,
    inner: Arc<Mutex<Container>>,
}

impl Surface {
    fn lock(&self) -> MutexGuard<'_, Container> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn width(&self) -> i64 {
        self.lock().width_px
    }

    pub fn set_width(&self, width_px: i64) {
        self.lock().width_px = width_px;
    }

    pub fn is_attached(&self) -> bool {
        self.lock().attached
    }

    /// Replace the whole content.
    pub fn set_content(&self, content: Content) {
        self.lock().content = content;
    }

    pub fn content(&self) -> Content {
        self.lock().content.clone()
    }

    /// Mutate the widget view in place. Returns `false` when the container does
    /// not hold a widget view.
    pub fn update_view(&self, f: impl FnOnce(&mut WidgetView)) -> bool {
        match &mut self.lock().content {
            Content::Widget(view) => {
                f(view);
                true
            }
            _ => false,
        }
    }

    pub fn clear(&self) {
        self.set_content(Content::Empty);
    }
}

#[derive(Debug, Default)]
struct PageInner {
    containers: HashMap<String, Surface>,
    /// Top-level containers in mount order.
    roots: Vec<String>,
}

/// All containers of the dashboard page.
#[derive(Debug, Clone, Default)]
pub struct Page {
    inner: Arc<RwLock<PageInner>>,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a top-level container. Re-mounting an id replaces it.
    pub fn mount(&self, id: &str, width_px: i64) -> Surface {
        let surface = self.attach(id, width_px);
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if !inner.roots.iter().any(|r| r == id) {
            inner.roots.push(id.to_string());
        }
        surface
    }

    /// Attach a nested container (not listed among the roots).
    pub fn attach(&self, id: &str, width_px: i64) -> Surface {
        let surface = Surface {
            id: id.to_string(),
            inner: Arc::new(Mutex::new(Container {
                width_px,
                content: Content::Empty,
                attached: true,
            })),
        };
        let previous = self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .containers
            .insert(id.to_string(), surface.clone());
        if let Some(old) = previous {
            old.lock().attached = false;
        }
        surface
    }

    pub fn surface(&self, id: &str) -> Option<Surface> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .containers
            .get(id)
            .cloned()
    }

    #[cfg(test)]
    pub fn contains(&self, id: &str) -> bool {
        self.surface(id).is_some()
    }

    pub fn roots(&self) -> Vec<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .roots
            .clone()
    }

    /// Detach a container and, recursively, its children.
    pub fn detach(&self, id: &str) {
        let removed = {
            let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
            inner.roots.retain(|r| r != id);
            inner.containers.remove(id)
        };

        if let Some(surface) = removed {
            let children = {
                let mut container = surface.lock();
                container.attached = false;
                match std::mem::take(&mut container.content) {
                    Content::Children(ids) => ids,
                    _ => Vec::new(),
                }
            };
            for child in children {
                self.detach(&child);
            }
        }
    }

    /// HTML for one container including nested children.
    pub fn render_html(&self, id: &str) -> Option<String> {
        let surface = self.surface(id)?;
        let content = surface.content();
        let body = match content {
            Content::Empty => String::new(),
            Content::Placeholder(p) => p.to_html(),
            Content::Widget(view) => view.to_html(id),
            Content::Children(ids) => ids
                .iter()
                .filter_map(|child| self.render_html(child))
                .collect::<Vec<_>>()
                .join("\n"),
        };
        Some(format!(
            r#"<div id="{}" class="timeline-host">{}</div>"#,
            escape_html(id),
            body
        ))
    }
}
