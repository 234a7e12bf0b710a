//! Localized message strings.
//!
//! Lookup is by `MessageKey` and `Language`; every language provides every
//! key. Messages may contain `{name}` placeholders filled by `t_with`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Supported display languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Es,
    Fr,
    De,
    Hi,
}

impl Language {
    pub const ALL: [Language; 5] = [
        Language::En,
        Language::Es,
        Language::Fr,
        Language::De,
        Language::Hi,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
            Language::Fr => "fr",
            Language::De => "de",
            Language::Hi => "hi",
        }
    }

    /// Parses a locale tag such as `fr`, `de-DE` or `es_MX.UTF-8`.
    ///
    /// Only the primary subtag is considered.
    pub fn from_code(code: &str) -> Option<Self> {
        let primary = code
            .split(['-', '_', '.'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        Self::ALL.into_iter().find(|lang| lang.code() == primary)
    }

    /// Language from the `LANG` environment variable, English otherwise.
    pub fn from_env() -> Self {
        std::env::var("LANG")
            .ok()
            .and_then(|value| Self::from_code(&value))
            .unwrap_or_default()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| {
            format!("unsupported language '{}' (expected one of: en, es, fr, de, hi)", s)
        })
    }
}

/// Message identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    Pomodoro,
    DeepFocus,
    Custom,
    Focusing,
    Paused,
    ReadyToFocus,
    SessionCompleted,
    /// Takes `{duration}`.
    SessionCompletedDesc,
    SessionSavedTitle,
    /// Takes `{duration}`.
    SessionSavedDesc,
    NoData,
    NoDataDesc,
    ExportSuccessful,
    ExportSuccessfulDesc,
    NotificationsEnabled,
    NotificationPermissionDenied,
    Streak,
    TotalSessions,
    CompletionRate,
}

/// Looks up a message.
pub fn t(key: MessageKey, lang: Language) -> &'static str {
    match lang {
        Language::En => en(key),
        Language::Es => es(key),
        Language::Fr => fr(key),
        Language::De => de(key),
        Language::Hi => hi(key),
    }
}

/// Looks up a message and substitutes `{name}` placeholders.
///
/// Unknown placeholders are left as-is.
pub fn t_with(key: MessageKey, lang: Language, params: &[(&str, &str)]) -> String {
    params
        .iter()
        .fold(t(key, lang).to_string(), |text, (name, value)| {
            text.replace(&format!("{{{}}}", name), value)
        })
}

fn en(key: MessageKey) -> &'static str {
    use MessageKey::*;
    match key {
        Pomodoro => "Pomodoro",
        DeepFocus => "Deep Focus",
        Custom => "Custom",
        Focusing => "Focusing...",
        Paused => "Paused",
        ReadyToFocus => "Ready to focus",
        SessionCompleted => "Session Completed!",
        SessionCompletedDesc => "Fantastic work! You've completed a {duration}-minute focus session.",
        SessionSavedTitle => "Session Saved!",
        SessionSavedDesc => "Your {duration}-minute session has been saved to history.",
        NoData => "No Data",
        NoDataDesc => "No sessions to export.",
        ExportSuccessful => "Export Successful",
        ExportSuccessfulDesc => "Your session data has been exported to CSV.",
        NotificationsEnabled => "Notifications Enabled",
        NotificationPermissionDenied => "Please enable notifications in your system settings.",
        Streak => "Streak",
        TotalSessions => "Total Sessions",
        CompletionRate => "completion rate",
    }
}

fn es(key: MessageKey) -> &'static str {
    use MessageKey::*;
    match key {
        Pomodoro => "Pomodoro",
        DeepFocus => "Enfoque Profundo",
        Custom => "Personalizado",
        Focusing => "Enfocándose...",
        Paused => "Pausado",
        ReadyToFocus => "Listo para enfocar",
        SessionCompleted => "¡Sesión Completada!",
        SessionCompletedDesc => "¡Trabajo fantástico! Has completado una sesión de enfoque de {duration} minutos.",
        SessionSavedTitle => "¡Sesión Guardada!",
        SessionSavedDesc => "Tu sesión de {duration} minutos ha sido guardada en el historial.",
        NoData => "Sin Datos",
        NoDataDesc => "No hay sesiones para exportar.",
        ExportSuccessful => "Exportación Exitosa",
        ExportSuccessfulDesc => "Tus datos de sesión han sido exportados a CSV.",
        NotificationsEnabled => "Notificaciones Habilitadas",
        NotificationPermissionDenied => "Por favor habilita las notificaciones en la configuración de tu sistema.",
        Streak => "Racha",
        TotalSessions => "Sesiones Totales",
        CompletionRate => "tasa de finalización",
    }
}

fn fr(key: MessageKey) -> &'static str {
    use MessageKey::*;
    match key {
        Pomodoro => "Pomodoro",
        DeepFocus => "Concentration Profonde",
        Custom => "Personnalisé",
        Focusing => "Concentration...",
        Paused => "En Pause",
        ReadyToFocus => "Prêt à se concentrer",
        SessionCompleted => "Session Terminée !",
        SessionCompletedDesc => "Travail fantastique ! Vous avez terminé une session de concentration de {duration} minutes.",
        SessionSavedTitle => "Session Sauvegardée !",
        SessionSavedDesc => "Votre session de {duration} minutes a été sauvegardée dans l'historique.",
        NoData => "Aucune Donnée",
        NoDataDesc => "Aucune session à exporter.",
        ExportSuccessful => "Exportation Réussie",
        ExportSuccessfulDesc => "Vos données de session ont été exportées en CSV.",
        NotificationsEnabled => "Notifications Activées",
        NotificationPermissionDenied => "Veuillez activer les notifications dans les paramètres de votre système.",
        Streak => "Série",
        TotalSessions => "Sessions Totales",
        CompletionRate => "taux de réussite",
    }
}

fn de(key: MessageKey) -> &'static str {
    use MessageKey::*;
    match key {
        Pomodoro => "Pomodoro",
        DeepFocus => "Tiefe Konzentration",
        Custom => "Benutzerdefiniert",
        Focusing => "Fokussierung...",
        Paused => "Pausiert",
        ReadyToFocus => "Bereit zum Fokussieren",
        SessionCompleted => "Sitzung Abgeschlossen!",
        SessionCompletedDesc => "Fantastische Arbeit! Sie haben eine {duration}-minütige Fokussitzung abgeschlossen.",
        SessionSavedTitle => "Sitzung Gespeichert!",
        SessionSavedDesc => "Ihre {duration}-minütige Sitzung wurde im Verlauf gespeichert.",
        NoData => "Keine Daten",
        NoDataDesc => "Keine Sitzungen zum Exportieren.",
        ExportSuccessful => "Export Erfolgreich",
        ExportSuccessfulDesc => "Ihre Sitzungsdaten wurden als CSV exportiert.",
        NotificationsEnabled => "Benachrichtigungen Aktiviert",
        NotificationPermissionDenied => "Bitte aktivieren Sie Benachrichtigungen in Ihren Systemeinstellungen.",
        Streak => "Serie",
        TotalSessions => "Gesamte Sitzungen",
        CompletionRate => "Abschlussrate",
    }
}

fn hi(key: MessageKey) -> &'static str {
    use MessageKey::*;
    match key {
        Pomodoro => "पोमोडोरो",
        DeepFocus => "गहरा फोकस",
        Custom => "कस्टम",
        Focusing => "फोकस कर रहे हैं...",
        Paused => "रोका गया",
        ReadyToFocus => "फोकस के लिए तैयार",
        SessionCompleted => "सेशन पूरा हुआ!",
        SessionCompletedDesc => "शानदार काम! आपने {duration} मिनट का फोकस सेशन पूरा किया है।",
        SessionSavedTitle => "सेशन सहेजा गया!",
        SessionSavedDesc => "आपका {duration} मिनट का सेशन इतिहास में सहेजा गया है।",
        NoData => "कोई डेटा नहीं",
        NoDataDesc => "निर्यात करने के लिए कोई सेशन नहीं।",
        ExportSuccessful => "निर्यात सफल",
        ExportSuccessfulDesc => "आपका सेशन डेटा CSV में निर्यात किया गया है।",
        NotificationsEnabled => "सूचनाएं सक्षम",
        NotificationPermissionDenied => "कृपया अपनी सिस्टम सेटिंग्स में सूचनाएं सक्षम करें।",
        Streak => "लगातार",
        TotalSessions => "कुल सेशन",
        CompletionRate => "पूर्णता दर",
    }
}
