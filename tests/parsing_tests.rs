use proptest::prelude::*;
use quickslot::algorithm::parsing::{clock_to_minutes, minutes_to_12h, parse_clock_12h, parse_enrollment, parse_schedule};
use quickslot::algorithm::{ScheduleCache, conflicts, is_at_capacity, is_at_risk, is_viable};
use quickslot::models::{Constraints, Day, Section, StatusTag};

#[test]
fn test_schedule_examples() {
    let p = parse_schedule("TTh 01:00 PM - 03:00 PM").expect("valid schedule");
    assert_eq!(p.days().iter().copied().collect::<Vec<_>>(), vec![Day::T, Day::Th]);
    assert_eq!((p.start_minute(), p.end_minute()), (780, 900));

    let p = parse_schedule("MWF 12:00 AM - 12:30 AM").expect("midnight block");
    assert_eq!((p.start_minute(), p.end_minute()), (0, 30));

    let p = parse_schedule("SSu 11:00 AM - 12:00 PM").expect("weekend");
    assert_eq!(p.days().len(), 2);
    assert!(p.days().contains(&Day::Su));
}

#[test]
fn test_schedule_rejects_garbage() {
    for text in [
        "",
        "   ",
        "TBA",
        "MX 10:00 AM - 11:00 AM",
        "MW 10:00 - 11:00",
        "MW 11:00 AM - 10:00 AM",
        "MW 10:00 AM - 10:00 AM",
        "MW 13:00 PM - 14:00 PM",
    ] {
        assert!(parse_schedule(text).is_none(), "should reject {:?}", text);
    }
}

#[test]
fn test_trailing_text_after_block() {
    let p = parse_schedule("MW 10:00 AM - 11:30 AM Room 5").expect("room suffix is ignored");
    assert_eq!((p.start_minute(), p.end_minute()), (600, 690));
    assert_eq!(p.days().len(), 2);
    assert!(parse_schedule("MW 10:00 AM - 11:30 AM   ").is_some());
    // el sufijo debe ir separado del AM/PM
    assert!(parse_schedule("MW 10:00 AM - 11:30 AMX").is_none());
}

#[test]
fn test_empty_day_prefix_is_accepted() {
    let p = parse_schedule("10:00 AM - 11:00 AM").expect("no days is still a schedule");
    assert!(p.days().is_empty());
    // sin días no puede chocar con nada
    let a = Section::new(1, "10:00 AM - 11:00 AM", "1/10", "OK");
    let b = Section::new(2, "MTWThF 10:00 AM - 11:00 AM", "1/10", "OK");
    assert!(!conflicts(&a, &b));
}

#[test]
fn test_clock_conversions() {
    assert_eq!(parse_clock_12h("12:00 AM"), Some(0));
    assert_eq!(parse_clock_12h("12:00 PM"), Some(720));
    assert_eq!(parse_clock_12h("01:30pm"), Some(810));
    assert_eq!(parse_clock_12h("0:15 AM"), Some(15));
    assert_eq!(parse_clock_12h("13:00 PM"), None);

    assert_eq!(clock_to_minutes("08:00"), Some(480));
    assert_eq!(clock_to_minutes("24:00"), Some(1440));
    assert_eq!(clock_to_minutes("24:01"), None);
    assert_eq!(clock_to_minutes("8:5"), None);
    assert_eq!(minutes_to_12h(810), "01:30 PM");
    assert_eq!(minutes_to_12h(0), "12:00 AM");
}

#[test]
fn test_enrollment_and_status() {
    let e = parse_enrollment("Enrolled: 25/30").expect("embedded ratio");
    assert_eq!((e.current, e.capacity), (25, 30));
    assert!(parse_enrollment("n/a").is_none());

    let full = Section::new(1, "MW 09:00 AM - 10:00 AM", "30/30", "OK");
    assert!(is_at_capacity(&full));
    assert_eq!(full.status_tag(), StatusTag::Full);

    let risky = Section::new(2, "MW 09:00 AM - 10:00 AM", "1/12", "OK");
    assert!(is_at_risk(&risky));
    assert_eq!(risky.status_tag(), StatusTag::AtRisk);

    // inscripción ilegible: se respeta la etiqueta
    let labelled = Section::new(3, "MW 09:00 AM - 10:00 AM", "?", "FULL");
    assert!(!is_at_capacity(&labelled));
    assert_eq!(labelled.status_tag(), StatusTag::Full);
}

#[test]
fn test_unparseable_section_is_never_viable_and_never_conflicts() {
    let bad = Section::new(1, "TBA", "5/30", "OK");
    let good = Section::new(2, "MW 09:00 AM - 10:00 AM", "5/30", "OK");
    assert!(!is_viable(&bad, &Constraints::default()));
    assert!(!conflicts(&bad, &good));
}

#[test]
fn test_schedule_cache_counts() {
    let mut cache = ScheduleCache::new();
    let a = cache.section(1, "MW 09:00 AM - 10:00 AM", "5/30", "OK");
    let b = cache.section(2, "MW 09:00 AM - 10:00 AM", "7/30", "OK");
    let _ = cache.section(3, "TTh 09:00 AM - 10:00 AM", "7/30", "OK");
    assert_eq!(cache.stats(), (1, 2, 2));
    assert_eq!(a.parsed(), b.parsed());
}

fn block() -> impl Strategy<Value = Section> {
    let days = prop::sample::select(vec!["M", "T", "W", "Th", "F", "MW", "TTh", "MWF", "SSu"]);
    (days, 0u16..40, 1u16..6).prop_map(|(d, slot, len)| {
        let start = 7 * 60 + slot * 15;
        let end = start + len * 15;
        Section::new(1, format!("{} {} - {}", d, minutes_to_12h(start), minutes_to_12h(end)), "5/30", "OK")
    })
}

proptest! {
    #[test]
    fn prop_conflict_is_symmetric(a in block(), b in block()) {
        prop_assert_eq!(conflicts(&a, &b), conflicts(&b, &a));
    }

    #[test]
    fn prop_section_conflicts_with_itself(a in block()) {
        prop_assert!(conflicts(&a, &a));
    }

    #[test]
    fn prop_disjoint_days_never_conflict(slot_a in 0u16..40, slot_b in 0u16..40) {
        let a = Section::new(1, format!("MW {} - {}", minutes_to_12h(420 + slot_a * 15), minutes_to_12h(480 + slot_a * 15)), "5/30", "OK");
        let b = Section::new(2, format!("TTh {} - {}", minutes_to_12h(420 + slot_b * 15), minutes_to_12h(480 + slot_b * 15)), "5/30", "OK");
        prop_assert!(!conflicts(&a, &b));
    }

    #[test]
    fn prop_adjacent_blocks_never_conflict(slot in 0u16..40, len in 1u16..6) {
        let start = 420 + slot * 15;
        let mid = start + len * 15;
        let a = Section::new(1, format!("MW {} - {}", minutes_to_12h(start), minutes_to_12h(mid)), "5/30", "OK");
        let b = Section::new(2, format!("MW {} - {}", minutes_to_12h(mid), minutes_to_12h(mid + 30)), "5/30", "OK");
        prop_assert!(!conflicts(&a, &b));
    }

    #[test]
    fn prop_parse_never_panics(text in ".{0,40}") {
        let _ = parse_schedule(&text);
    }
}
