use std::cell::RefCell;
use std::rc::Rc;

use eframe::egui::emath::easing;
use eframe::egui::{Align2, Color32, Context, FontId, Id, LayerId, Order, Pos2, Rect, Stroke, vec2};

pub const FADE_SECONDS: f64 = 0.2;
pub const SHOWN_OPACITY: f32 = 0.9;
pub const ANCHOR_OFFSET: f32 = 28.0;

#[derive(Clone, Copy, Debug)]
struct Fade {
    from: f32,
    to: f32,
    started_at: f64,
}

impl Fade {
    fn value(self, now: f64) -> f32 {
        let elapsed = now - self.started_at;
        if elapsed.is_nan() {
            return self.to;
        }
        let t = (elapsed / FADE_SECONDS).clamp(0.0, 1.0) as f32;
        self.from + (self.to - self.from) * easing::cubic_in_out(t)
    }

    fn finished(self, now: f64) -> bool {
        now - self.started_at >= FADE_SECONDS
    }
}

#[derive(Debug)]
pub struct TooltipOverlay {
    content: String,
    position: Pos2,
    fade: Fade,
}

impl TooltipOverlay {
    fn new() -> Self {
        Self {
            content: String::new(),
            position: Pos2::ZERO,
            fade: Fade {
                from: 0.0,
                to: 0.0,
                started_at: f64::NEG_INFINITY,
            },
        }
    }

    pub fn show(&mut self, content: impl Into<String>, anchor: Pos2, now: f64) {
        self.content = content.into();
        self.position = anchor - vec2(0.0, ANCHOR_OFFSET);
        self.fade = Fade {
            from: self.opacity(now),
            to: SHOWN_OPACITY,
            started_at: now,
        };
    }

    pub fn hide(&mut self, now: f64) {
        self.fade = Fade {
            from: self.opacity(now),
            to: 0.0,
            started_at: now,
        };
    }

    pub fn opacity(&self, now: f64) -> f32 {
        self.fade.value(now)
    }

    pub fn is_animating(&self, now: f64) -> bool {
        !self.fade.finished(now)
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn position(&self) -> Pos2 {
        self.position
    }

    pub fn paint(&self, ctx: &Context, now: f64) {
        let opacity = self.opacity(now);
        if opacity <= 0.0 || self.content.is_empty() {
            return;
        }

        let painter = ctx.layer_painter(LayerId::new(Order::Tooltip, Id::new("graph-tooltip")));
        let galley = painter.layout_no_wrap(
            self.content.clone(),
            FontId::proportional(12.0),
            Color32::BLACK.gamma_multiply(opacity),
        );
        let padding = vec2(6.0, 4.0);
        let rect = Rect::from_min_size(self.position, galley.size() + padding * 2.0);
        painter.rect_filled(
            rect,
            4.0,
            Color32::from_rgb(255, 255, 224).gamma_multiply(opacity),
        );
        painter.rect_stroke(
            rect,
            4.0,
            Stroke::new(1.0, Color32::from_gray(120).gamma_multiply(opacity)),
            eframe::egui::StrokeKind::Inside,
        );
        let text_pos = Align2::LEFT_TOP.align_size_within_rect(galley.size(), rect.shrink2(padding));
        painter.galley(text_pos.min, galley, Color32::BLACK);
    }
}

#[derive(Clone, Debug)]
pub struct TooltipHandle(Rc<RefCell<TooltipOverlay>>);

thread_local! {
    static SHARED_OVERLAY: TooltipHandle =
        TooltipHandle(Rc::new(RefCell::new(TooltipOverlay::new())));
}

impl TooltipHandle {
    /// Returns the overlay for this UI thread, creating it on first use.
    pub fn acquire() -> Self {
        SHARED_OVERLAY.with(Clone::clone)
    }

    pub fn show(&self, content: impl Into<String>, anchor: Pos2, now: f64) {
        self.0.borrow_mut().show(content, anchor, now);
    }

    pub fn hide(&self, now: f64) {
        self.0.borrow_mut().hide(now);
    }

    pub fn with<R>(&self, read: impl FnOnce(&TooltipOverlay) -> R) -> R {
        read(&self.0.borrow())
    }

    pub fn same_overlay(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fades_in_and_out() {
        let mut overlay = TooltipOverlay::new();
        assert_eq!(overlay.opacity(0.0), 0.0);

        overlay.show("Invocations: 3", Pos2::new(100.0, 100.0), 1.0);
        assert_eq!(overlay.opacity(1.0), 0.0);
        let midway = overlay.opacity(1.1);
        assert!(midway > 0.0 && midway < SHOWN_OPACITY);
        assert!(overlay.is_animating(1.1));
        assert!((overlay.opacity(1.2) - SHOWN_OPACITY).abs() < 1e-6);
        assert!(!overlay.is_animating(1.25));

        overlay.hide(2.0);
        assert!((overlay.opacity(2.0) - SHOWN_OPACITY).abs() < 1e-6);
        assert_eq!(overlay.opacity(2.5), 0.0);
    }

    #[test]
    fn sits_above_the_anchor() {
        let mut overlay = TooltipOverlay::new();
        overlay.show("x", Pos2::new(40.0, 90.0), 0.0);
        assert_eq!(overlay.position(), Pos2::new(40.0, 62.0));
        assert_eq!(overlay.content(), "x");
    }

    #[test]
    fn interrupted_fade_starts_from_current_opacity() {
        let mut overlay = TooltipOverlay::new();
        overlay.show("a", Pos2::ZERO, 0.0);
        let partial = overlay.opacity(0.1);
        overlay.hide(0.1);
        assert!((overlay.opacity(0.1) - partial).abs() < 1e-6);
    }

    #[test]
    fn acquire_returns_one_overlay_per_thread() {
        let first = TooltipHandle::acquire();
        let second = TooltipHandle::acquire();
        assert!(first.same_overlay(&second));

        first.show("from first", Pos2::ZERO, 0.0);
        assert_eq!(second.with(|overlay| overlay.content().to_owned()), "from first");
        second.hide(1.0);
        assert_eq!(first.with(|overlay| overlay.opacity(2.0)), 0.0);
    }
}
