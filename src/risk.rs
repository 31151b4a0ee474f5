use serde::Serialize;

/// Index of the safe-driving class. Low-confidence predictions and unknown
/// indices resolve to this entry.
pub const SAFE_CLASS: usize = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskTier {
    Bajo,
    Moderado,
    Alto,
    #[serde(rename = "CRÍTICO")]
    Critico,
}

/// CSS class the front end uses to colour the result banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Success,
    Warning,
    Error,
}

#[derive(Debug, PartialEq, Eq)]
pub struct RiskEntry {
    pub class_index: usize,
    pub base_score: u8,
    pub tier: RiskTier,
    pub message: &'static str,
    pub category: Category,
    pub class_name: &'static str,
}

pub static RISK_TABLE: [RiskEntry; 10] = [
    RiskEntry {
        class_index: 0,
        base_score: 100,
        tier: RiskTier::Bajo,
        message: "Conducción segura. Excelente! La atención plena en la carretera es clave.",
        category: Category::Success,
        class_name: "Conducción Normal",
    },
    RiskEntry {
        class_index: 1,
        base_score: 5,
        tier: RiskTier::Critico,
        message: "Desviar la vista y la mente para enviar mensajes aumenta drásticamente el riesgo. Detente antes de enviar mensajes.",
        category: Category::Error,
        class_name: "Enviando mensajes de texto (derecha)",
    },
    RiskEntry {
        class_index: 2,
        base_score: 10,
        tier: RiskTier::Alto,
        message: "Una llamada sin manos libres duplica la probabilidad de accidente. Cuelga o usa el manos libres.",
        category: Category::Error,
        class_name: "Hablando por teléfono (derecha)",
    },
    RiskEntry {
        class_index: 3,
        base_score: 5,
        tier: RiskTier::Critico,
        message: "La distracción cognitiva, visual y manual que implica enviar mensajes es una de las principales causas de choques fatales. Espera a llegar a tu destino.",
        category: Category::Error,
        class_name: "Enviando mensajes de texto (izquierda)",
    },
    RiskEntry {
        class_index: 4,
        base_score: 10,
        tier: RiskTier::Alto,
        message: "El uso del teléfono sin manos libres reduce el tiempo de reacción al frenado. Cuelga o usa en manos libres.",
        category: Category::Error,
        class_name: "Hablando por teléfono (izquierda)",
    },
    RiskEntry {
        class_index: 5,
        base_score: 40,
        tier: RiskTier::Moderado,
        message: "Ajustar controles distrae la vista y las manos. Tómate el tiempo necesario para hacer ajustes solo cuando sea seguro.",
        category: Category::Warning,
        class_name: "Operando la radio/climatizador",
    },
    RiskEntry {
        class_index: 6,
        base_score: 30,
        tier: RiskTier::Moderado,
        message: "Beber requiere una mano fuera del volante y distracción visual. Bebe solo en paradas seguras o con extrema precaución.",
        category: Category::Warning,
        class_name: "Bebiendo",
    },
    RiskEntry {
        class_index: 7,
        base_score: 15,
        tier: RiskTier::Alto,
        message: "Desviar la vista de la carretera y girar el torso es extremadamente peligroso. Detente o pídale a un pasajero que lo alcance.",
        category: Category::Error,
        class_name: "Alcanzando algo detrás",
    },
    RiskEntry {
        class_index: 8,
        base_score: 20,
        tier: RiskTier::Alto,
        message: "El coche no es un tocador. Esta acción desvía la atención visual y cognitiva. Detente antes de realizar aseo personal.",
        category: Category::Error,
        class_name: "Aseo personal (Maquillaje/Pelo)",
    },
    RiskEntry {
        class_index: 9,
        base_score: 60,
        tier: RiskTier::Bajo,
        message: "Conversación intensa puede desviar tu atención cognitiva del tráfico. Evita miradas prolongadas al pasajero.",
        category: Category::Warning,
        class_name: "Hablando con el pasajero",
    },
];

/// Looks up the entry for `class_index`, falling back to the safe-driving
/// entry for indices outside the table.
pub fn lookup(class_index: usize) -> &'static RiskEntry {
    RISK_TABLE
        .get(class_index)
        .unwrap_or(&RISK_TABLE[SAFE_CLASS])
}
