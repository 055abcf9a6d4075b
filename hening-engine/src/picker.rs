//! Selection state for the bell, ambiance and interval pickers
//!
//! [`CatalogPicker`] is the single-select over named sounds used for both
//! the bell and the ambiance screens. [`OffsetSelection`] is the multi-select
//! of bell offsets. Both keep a tentative choice that only becomes the
//! committed one on `save()`.

use crate::error::{Error, Result};
use crate::preview::PreviewPlayer;
use crate::sound::{SoundCategory, SoundHandle, SoundPool};
use hening_common::Offset;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

type Resolver = Box<dyn Fn(&str) -> SoundHandle + Send + Sync>;

/// Single-select over a list of named options
pub struct CatalogPicker {
    options: Vec<String>,
    committed: String,
    tentative: Option<String>,
    on_select: Box<dyn FnMut(&str) + Send>,
    preview: Option<(PreviewPlayer, Resolver)>,
}

impl std::fmt::Debug for CatalogPicker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogPicker")
            .field("options", &self.options)
            .field("committed", &self.committed)
            .field("tentative", &self.tentative)
            .finish()
    }
}

impl CatalogPicker {
    /// Picker over `options`, starting at `initial`.
    ///
    /// Fails if `initial` is not one of the options.
    pub fn new(
        options: Vec<String>,
        initial: impl Into<String>,
        on_select: impl FnMut(&str) + Send + 'static,
    ) -> Result<Self> {
        let initial = initial.into();
        if !options.contains(&initial) {
            return Err(Error::NotFound(format!("'{}' is not an option", initial)));
        }
        Ok(Self {
            options,
            committed: initial,
            tentative: None,
            on_select: Box::new(on_select),
            preview: None,
        })
    }

    /// Picker over one pool category, previewing each choice through `player`
    pub fn for_category(
        pool: Arc<SoundPool>,
        category: SoundCategory,
        initial: impl Into<String>,
        player: PreviewPlayer,
        on_select: impl FnMut(&str) + Send + 'static,
    ) -> Result<Self> {
        let picker = Self::new(pool.names(category), initial, on_select)?;
        Ok(picker.with_preview(player, move |name| pool.get_in(category, name)))
    }

    /// Play each tentative choice through `player`
    pub fn with_preview(
        mut self,
        player: PreviewPlayer,
        resolve: impl Fn(&str) -> SoundHandle + Send + Sync + 'static,
    ) -> Self {
        self.preview = Some((player, Box::new(resolve)));
        self
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Last saved choice
    pub fn selected(&self) -> &str {
        &self.committed
    }

    /// Choice shown as highlighted: the tentative one if any
    pub fn highlighted(&self) -> &str {
        self.tentative.as_deref().unwrap_or(&self.committed)
    }

    /// Highlight an option and preview it
    pub fn choose(&mut self, name: &str) -> Result<()> {
        if !self.options.iter().any(|option| option == name) {
            return Err(Error::NotFound(format!("'{}' is not an option", name)));
        }
        self.tentative = Some(name.to_string());
        if let Some((player, resolve)) = &self.preview {
            player.play(&resolve(name));
        }
        Ok(())
    }

    /// Stop the preview, commit the highlighted choice and report it
    pub fn save(&mut self) -> &str {
        self.stop_preview();
        if let Some(choice) = self.tentative.take() {
            self.committed = choice;
        }
        debug!("Picker saved '{}'", self.committed);
        (self.on_select)(&self.committed);
        &self.committed
    }

    /// Stop the preview and forget the highlighted choice
    pub fn dismiss(&mut self) {
        self.stop_preview();
        self.tentative = None;
    }

    fn stop_preview(&self) {
        if let Some((player, _)) = &self.preview {
            player.stop();
        }
    }
}

/// Toggle set of bell offsets
pub struct OffsetSelection {
    committed: BTreeSet<Offset>,
    tentative: BTreeSet<Offset>,
    on_save: Box<dyn FnMut(&BTreeSet<Offset>) + Send>,
}

impl std::fmt::Debug for OffsetSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OffsetSelection")
            .field("committed", &self.committed)
            .field("tentative", &self.tentative)
            .finish()
    }
}

impl OffsetSelection {
    pub fn new(
        initial: impl IntoIterator<Item = Offset>,
        on_save: impl FnMut(&BTreeSet<Offset>) + Send + 'static,
    ) -> Self {
        let committed: BTreeSet<Offset> = initial.into_iter().collect();
        Self {
            tentative: committed.clone(),
            committed,
            on_save: Box::new(on_save),
        }
    }

    /// Flip one offset, returning whether it is now selected
    pub fn toggle(&mut self, offset: Offset) -> bool {
        if self.tentative.remove(&offset) {
            false
        } else {
            self.tentative.insert(offset);
            true
        }
    }

    pub fn is_selected(&self, offset: Offset) -> bool {
        self.tentative.contains(&offset)
    }

    /// Last saved set
    pub fn selected(&self) -> &BTreeSet<Offset> {
        &self.committed
    }

    pub fn save(&mut self) -> &BTreeSet<Offset> {
        self.committed = self.tentative.clone();
        (self.on_save)(&self.committed);
        &self.committed
    }

    /// Discard toggles since the last save
    pub fn dismiss(&mut self) {
        self.tentative = self.committed.clone();
    }
}
