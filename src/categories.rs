//! Static service category catalogue.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
}

pub const CATEGORIES: &[Category] = &[
    Category {
        id: "plumbing",
        name: "Plumbing",
        icon: "🔧",
        description: "Fix leaks, install fixtures, and solve plumbing emergencies",
    },
    Category {
        id: "electrical",
        name: "Electrical",
        icon: "⚡",
        description: "Wiring, lighting installation, and electrical repairs",
    },
    Category {
        id: "carpentry",
        name: "Carpentry",
        icon: "🔨",
        description: "Custom furniture, repairs, and woodworking projects",
    },
    Category {
        id: "painting",
        name: "Painting",
        icon: "🖌️",
        description: "Interior and exterior painting for homes and businesses",
    },
    Category {
        id: "landscaping",
        name: "Landscaping",
        icon: "🌱",
        description: "Garden design, lawn care, and outdoor maintenance",
    },
    Category {
        id: "cleaning",
        name: "Cleaning",
        icon: "✨",
        description: "Deep cleaning, regular maintenance, and specialized cleaning services",
    },
    Category {
        id: "hvac",
        name: "HVAC",
        icon: "❄️",
        description: "Heating, ventilation, and air conditioning installation and repair",
    },
    Category {
        id: "roofing",
        name: "Roofing",
        icon: "🏠",
        description: "Roof installation, repair, and maintenance services",
    },
];

pub fn find(id: &str) -> Option<&'static Category> {
    CATEGORIES.iter().find(|c| c.id == id)
}
