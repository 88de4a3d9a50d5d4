use crate::model::project::Scene;
use crate::presentation::overlay::Overlay;
use crate::timeline::flatten::{FlatShot, flatten_scenes};

/// Manual slide-by-slide presentation over a flattened snapshot.
///
/// Navigation wraps around in both directions.
#[derive(Clone, Debug)]
pub struct Slideshow {
    slides: Vec<FlatShot>,
    current: usize,
}

/// The slide currently shown.
#[derive(Clone, Debug, PartialEq)]
pub struct Slide<'a> {
    /// Position in the flattened list.
    pub index: usize,
    /// Number of slides.
    pub count: usize,
    /// Shot on screen.
    pub shot: &'a FlatShot,
    /// Overlay text for the shot.
    pub overlay: Overlay,
}

impl Slideshow {
    /// Open at the first shot; `None` when there is nothing to present.
    pub fn open(scenes: &[Scene]) -> Option<Self> {
        let slides = flatten_scenes(scenes);
        if slides.is_empty() {
            tracing::debug!("nothing to present");
            return None;
        }
        Some(Self { slides, current: 0 })
    }

    /// Number of slides.
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    /// Always `false`; an open slideshow has at least one slide.
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Index of the slide on screen.
    pub fn position(&self) -> usize {
        self.current
    }

    /// Slide on screen.
    pub fn current(&self) -> Slide<'_> {
        let shot = &self.slides[self.current];
        Slide {
            index: self.current,
            count: self.slides.len(),
            shot,
            overlay: Overlay::for_shot(shot),
        }
    }

    /// Jump to `i`, wrapping negative and out-of-range positions.
    pub fn show_at(&mut self, i: isize) -> Slide<'_> {
        let n = self.slides.len() as isize;
        self.current = i.rem_euclid(n) as usize;
        self.current()
    }

    /// Advance one slide (last wraps to first).
    pub fn next(&mut self) -> Slide<'_> {
        self.show_at(self.current as isize + 1)
    }

    /// Go back one slide (first wraps to last).
    pub fn prev(&mut self) -> Slide<'_> {
        self.show_at(self.current as isize - 1)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/presentation/navigator.rs"]
mod tests;
