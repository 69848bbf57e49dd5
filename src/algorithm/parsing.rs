// Funciones para parsear horarios ("MW 10:00 AM - 11:30 AM") a minutos.

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use regex::Regex;

use crate::models::{Day, Enrollment, ParsedSchedule, Section, MINUTES_PER_DAY};

// Tras el bloque horario se tolera texto separado por espacios ("... 11:30 AM Sala 5").
static SCHEDULE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?P<days>[a-z]*)\s*(?P<h1>\d{1,2}):(?P<m1>\d{2})\s*(?P<ap1>[ap]m)\s*-\s*(?P<h2>\d{1,2}):(?P<m2>\d{2})\s*(?P<ap2>[ap]m)(?:\s+.*)?$",
    )
    .expect("schedule regex is valid")
});

static CLOCK_12H_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(\d{1,2}):(\d{2})\s*([ap]m)\s*$").expect("12h clock regex is valid")
});

static ENROLLMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)/(\d+)").expect("enrollment regex is valid"));

/// Convierte hora/minuto/AM-PM a minutos desde medianoche.
/// 12 AM -> 0, 12 PM -> 720; en otro caso `hour % 12 * 60 + minute (+720 si PM)`.
fn to_minutes_12h(hour: u16, minute: u16, pm: bool) -> Option<u16> {
    if hour > 12 || minute > 59 {
        return None;
    }
    let base = (hour % 12) * 60 + minute;
    Some(if pm { base + 720 } else { base })
}

/// Parsea "10:00 AM" (también "10:00am", "10:00  PM") a minutos.
pub fn parse_clock_12h(text: &str) -> Option<u16> {
    let caps = CLOCK_12H_RE.captures(text)?;
    let hour: u16 = caps[1].parse().ok()?;
    let minute: u16 = caps[2].parse().ok()?;
    to_minutes_12h(hour, minute, caps[3].eq_ignore_ascii_case("pm"))
}

/// Tokeniza el prefijo de días. `Th` y `Su` son una sola unidad; cualquier
/// otro carácter fuera de {M,T,W,F,S} invalida el prefijo completo.
fn parse_days(prefix: &str) -> Option<BTreeSet<Day>> {
    let chars: Vec<char> = prefix.chars().collect();
    let mut days = BTreeSet::new();
    let mut i = 0;
    while i < chars.len() {
        let next = chars.get(i + 1).copied();
        let (day, width) = match (chars[i], next) {
            ('T', Some('h')) => (Day::Th, 2),
            ('S', Some('u')) => (Day::Su, 2),
            ('M', _) => (Day::M, 1),
            ('T', _) => (Day::T, 1),
            ('W', _) => (Day::W, 1),
            ('F', _) => (Day::F, 1),
            ('S', _) => (Day::S, 1),
            _ => return None,
        };
        days.insert(day);
        i += width;
    }
    Some(days)
}

/// Parsea un horario completo: prefijo de días (opcional) + rango 12h.
///
/// Devuelve `None` (nunca falla con pánico) si el texto está vacío, si el prefijo
/// contiene días desconocidos, si el rango no calza con `H:MM AM - H:MM PM`, o si
/// el inicio no es anterior al fin.
///
/// ```
/// use quickslot::algorithm::parsing::parse_schedule;
///
/// let p = parse_schedule("MW 10:00 AM - 11:30 AM").unwrap();
/// assert_eq!((p.start_minute(), p.end_minute()), (600, 690));
/// assert!(parse_schedule("MW 25:00 AM - x").is_none());
/// ```
pub fn parse_schedule(text: &str) -> Option<ParsedSchedule> {
    if text.trim().is_empty() {
        return None;
    }
    let caps = SCHEDULE_RE.captures(text)?;
    let days = parse_days(&caps["days"])?;

    let start = to_minutes_12h(
        caps["h1"].parse().ok()?,
        caps["m1"].parse().ok()?,
        caps["ap1"].eq_ignore_ascii_case("pm"),
    )?;
    let end = to_minutes_12h(
        caps["h2"].parse().ok()?,
        caps["m2"].parse().ok()?,
        caps["ap2"].eq_ignore_ascii_case("pm"),
    )?;

    ParsedSchedule::new(days, start, end)
}

/// "HH:MM" en 24h -> minutos. Acepta "24:00" como fin de día.
pub fn clock_to_minutes(text: &str) -> Option<u16> {
    let (h, m) = text.trim().split_once(':')?;
    if m.len() != 2 {
        return None;
    }
    let hour: u16 = h.parse().ok()?;
    let minute: u16 = m.parse().ok()?;
    if minute > 59 {
        return None;
    }
    let total = hour.checked_mul(60)?.checked_add(minute)?;
    (total <= MINUTES_PER_DAY).then_some(total)
}

/// Minutos -> "HH:MM" (24h).
pub fn minutes_to_clock(minutes: u16) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Minutos -> "hh:MM AM|PM", el formato que usan los archivos de oferta.
pub fn minutes_to_12h(minutes: u16) -> String {
    let minutes = minutes % MINUTES_PER_DAY;
    let (hour24, minute) = (minutes / 60, minutes % 60);
    let suffix = if hour24 >= 12 { "PM" } else { "AM" };
    let hour12 = match hour24 % 12 {
        0 => 12,
        h => h,
    };
    format!("{:02}:{:02} {}", hour12, minute, suffix)
}

/// Busca la primera ocurrencia "current/capacity" dentro del texto de inscripción.
pub fn parse_enrollment(text: &str) -> Option<Enrollment> {
    let caps = ENROLLMENT_RE.captures(text)?;
    Some(Enrollment {
        current: caps[1].parse().ok()?,
        capacity: caps[2].parse().ok()?,
    })
}

/// Memoización de `parse_schedule` por texto de horario.
///
/// Los archivos de oferta repiten mucho los mismos bloques ("MW 10:00 AM - ...");
/// los cargadores comparten una instancia para parsear cada texto distinto una vez.
/// No es global: cada carga es dueña de su caché.
#[derive(Debug, Default)]
pub struct ScheduleCache {
    entries: HashMap<String, Option<ParsedSchedule>>,
    hits: u64,
    misses: u64,
}

impl ScheduleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_parse(&mut self, text: &str) -> Option<ParsedSchedule> {
        if let Some(existing) = self.entries.get(text) {
            self.hits += 1;
            return existing.clone();
        }
        self.misses += 1;
        let parsed = parse_schedule(text);
        self.entries.insert(text.to_string(), parsed.clone());
        parsed
    }

    /// Construye una `Section` reutilizando el parseo cacheado de su horario.
    pub fn section(
        &mut self,
        group: u32,
        schedule: &str,
        enrolled: &str,
        status: &str,
    ) -> Section {
        let parsed = self.get_or_parse(schedule);
        Section::with_parsed(group, schedule, enrolled, status, parsed)
    }

    /// (hits, misses, entradas)
    pub fn stats(&self) -> (u64, u64, usize) {
        (self.hits, self.misses, self.entries.len())
    }
}
