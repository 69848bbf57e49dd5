// Predicados de viabilidad y de conflicto entre secciones.
use crate::models::{Constraints, Section};

/// True si la sección está llena (`current >= capacity`).
/// Inscripción ilegible => false.
pub fn is_at_capacity(section: &Section) -> bool {
    match section.enrollment() {
        Some(e) => e.current >= e.capacity,
        None => false,
    }
}

/// True si la sección corre riesgo de cerrarse por baja inscripción:
/// nadie inscrito, menos de 6 en un cupo de 20+, o menos de 2 en un cupo de 10+.
/// Inscripción ilegible => false.
pub fn is_at_risk(section: &Section) -> bool {
    match section.enrollment() {
        Some(e) => {
            e.current == 0
                || (e.capacity >= 20 && e.current < 6)
                || (e.capacity >= 10 && e.current < 2)
        }
        None => false,
    }
}

/// La sección cumple las restricciones por sí sola (ventana horaria + estado).
/// Un horario que no se pudo parsear nunca es viable.
pub fn is_viable(section: &Section, constraints: &Constraints) -> bool {
    let Some(parsed) = section.parsed() else {
        return false;
    };
    if parsed.start_minute() < constraints.earliest_minute
        || parsed.end_minute() > constraints.latest_minute
    {
        return false;
    }
    if !constraints.allow_full && is_at_capacity(section) {
        return false;
    }
    if !constraints.allow_at_risk && is_at_risk(section) {
        return false;
    }
    true
}

/// True si las dos secciones comparten algún día y sus rangos se solapan.
///
/// Rangos contiguos (uno termina cuando el otro empieza) no son conflicto.
/// Si alguno de los horarios no se pudo parsear se asume que no hay conflicto:
/// nunca se bloquea una rama por datos ilegibles.
pub fn conflicts(a: &Section, b: &Section) -> bool {
    match (a.parsed(), b.parsed()) {
        (Some(pa), Some(pb)) => pa.overlaps(pb),
        _ => false,
    }
}
