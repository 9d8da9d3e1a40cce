use super::*;

fn base() -> Url {
    Url::parse("http://127.0.0.1:5000/").expect("base url")
}

fn event(id: i64) -> Event {
    Event {
        id: EventId(id),
        name: format!("Event {id}"),
        description: None,
        event_date: None,
        image_url: None,
        registration_count: 0,
    }
}

fn ids(values: &[i64]) -> BTreeSet<EventId> {
    values.iter().copied().map(EventId).collect()
}

#[test]
fn registered_flag_follows_membership() {
    let cards = render_event_cards(&[event(1), event(2)], &ids(&[1]), &ids(&[]), &base());

    assert!(cards[0].registered);
    assert_eq!(cards[0].button_label(), "✓ Registered");
    assert!(!cards[1].registered);
    assert_eq!(cards[1].button_label(), "Register");
}

#[test]
fn pending_flag_follows_in_flight_set() {
    let cards = render_event_cards(&[event(1), event(2)], &ids(&[]), &ids(&[2]), &base());

    assert!(!cards[0].pending);
    assert!(cards[1].pending);
}

#[test]
fn catalog_states_map_to_messages() {
    let none = ids(&[]);
    assert_eq!(
        render_catalog(&Catalog::Failed, &none, &none, &base()),
        CatalogView::Message(FAILED_TO_LOAD_EVENTS)
    );
    assert_eq!(
        render_catalog(&Catalog::Loaded(Vec::new()), &none, &none, &base()),
        CatalogView::Message(NO_EVENTS_AVAILABLE)
    );
    assert_eq!(
        render_catalog(&Catalog::NotLoaded, &none, &none, &base()),
        CatalogView::Cards(Vec::new())
    );
}

#[test]
fn missing_fields_get_defaults() {
    let cards = render_event_cards(&[event(1)], &ids(&[]), &ids(&[]), &base());

    assert_eq!(cards[0].description, DEFAULT_EVENT_DESCRIPTION);
    assert_eq!(cards[0].date_label, DATE_TBD);
    assert!(!cards[0].has_server_image());
    assert_eq!(
        cards[0].image_src,
        "https://via.placeholder.com/400x300/39ff14/000000?text=TECH"
    );
}

#[test]
fn placeholders_cycle_through_palette_by_position() {
    let events: Vec<Event> = (1..=4).map(event).collect();
    let cards = render_event_cards(&events, &ids(&[]), &ids(&[]), &base());
    let labels: Vec<&str> = cards.iter().map(|c| c.fallback.label).collect();

    assert_eq!(labels, vec!["TECH", "CULTURE", "SPORTS", "TECH"]);
    assert_eq!(Placeholder::for_index(1).rgb(), [0x03, 0xda, 0xc6]);
    assert_eq!(Placeholder::for_index(2).rgb(), [0x99, 0x45, 0xff]);
}

#[test]
fn relative_image_urls_resolve_against_backend() {
    let mut with_image = event(1);
    with_image.image_url = Some("/static/images/zephyr.png".into());
    let mut absolute = event(2);
    absolute.image_url = Some("https://cdn.example.com/sojourn.jpg".into());

    let cards = render_event_cards(&[with_image, absolute], &ids(&[]), &ids(&[]), &base());

    assert_eq!(
        cards[0].image_src,
        "http://127.0.0.1:5000/static/images/zephyr.png"
    );
    assert!(cards[0].has_server_image());
    assert_eq!(cards[1].image_src, "https://cdn.example.com/sojourn.jpg");
    assert_eq!(cards[1].fallback.label, "CULTURE");
}

#[test]
fn event_dates_render_long_form() {
    assert_eq!(format_event_date(Some("2025-03-15")), "March 15, 2025");
    assert_eq!(format_event_date(Some("2025-12-01T18:30:00")), "December 1, 2025");
    assert_eq!(
        format_event_date(Some("2025-07-04T09:00:00+02:00")),
        "July 4, 2025"
    );
    assert_eq!(
        format_event_date(Some("Sat, 15 Mar 2025 00:00:00 GMT")),
        "March 15, 2025"
    );
}

#[test]
fn missing_or_odd_dates_fall_back() {
    assert_eq!(format_event_date(None), DATE_TBD);
    assert_eq!(format_event_date(Some("   ")), DATE_TBD);
    assert_eq!(format_event_date(Some("next spring")), "next spring");
}
