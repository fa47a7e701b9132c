use eframe::egui::Color32;

use super::model::{ServiceNode, ServiceType};

const LINK_WIDTH_SCALE: f32 = 0.5;
const LINK_LAYER_OPACITY: f32 = 0.6;
const LINK_MIN_OPACITY: f32 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    pub fn color(self) -> Color32 {
        match self {
            Self::Low => Color32::from_rgb(0x00, 0xFF, 0x00),
            Self::Medium => Color32::from_rgb(0xFF, 0x57, 0x33),
            Self::High => Color32::from_rgb(0xD3, 0x2F, 0x2F),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low Error (Green)",
            Self::Medium => "Medium Error (Orange)",
            Self::High => "High Error (Red)",
        }
    }
}

pub fn error_ratio(node: &ServiceNode) -> f64 {
    if node.invocations == 0 {
        return 0.0;
    }
    node.errors as f64 / node.invocations as f64
}

pub fn severity_of(node: &ServiceNode) -> Severity {
    let ratio = error_ratio(node);
    if ratio >= 0.9 {
        Severity::High
    } else if ratio > 0.4 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

pub fn color_of(node: &ServiceNode) -> Color32 {
    severity_of(node).color()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServiceIcon {
    Globe,
    Database,
    Archive,
    Stream,
    Card,
}

impl ServiceIcon {
    pub fn glyph(self) -> char {
        match self {
            Self::Globe => '\u{f0ac}',
            Self::Database => '\u{f1c0}',
            Self::Archive => '\u{f1c6}',
            Self::Stream => '\u{f1c8}',
            Self::Card => '\u{f2b9}',
        }
    }

    pub fn fallback_text(self) -> &'static str {
        match self {
            Self::Globe => "WEB",
            Self::Database => "SQL",
            Self::Archive => "KV",
            Self::Stream => "RPC",
            Self::Card => "SVC",
        }
    }
}

pub fn icon_of(node: &ServiceNode) -> ServiceIcon {
    match node.service_type {
        ServiceType::Http => ServiceIcon::Globe,
        ServiceType::MySql => ServiceIcon::Database,
        ServiceType::Redis => ServiceIcon::Archive,
        ServiceType::Grpc => ServiceIcon::Stream,
        ServiceType::Unknown | ServiceType::Other(_) => ServiceIcon::Card,
    }
}

pub fn link_width(invocations: u64) -> f32 {
    (invocations as f32).sqrt() * LINK_WIDTH_SCALE
}

pub fn link_color(latency_ms: f64) -> Color32 {
    let opacity = if latency_ms.is_finite() {
        ((latency_ms / 1000.0) as f32).clamp(LINK_MIN_OPACITY, 1.0)
    } else {
        1.0
    };
    Color32::from_black_alpha((opacity * LINK_LAYER_OPACITY * 255.0).round() as u8)
}
