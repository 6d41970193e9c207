//! Banks without a host binding accept any call sequence and keep
//! answering with their empty values.

use std::rc::Rc;
use std::time::Duration;

use pagewise_core::{
    Bank, ChannelBank, ChannelSource, ChannelType, ColorEntry, DeferredTasks, EffectTrackBank,
    FlatBinding, Item, ManualScheduler, MarkerBank, NameArrayBinding, NewChannel, SceneBank, SettleConfig,
    SettlePolicy, TrackBank, WindowedBank,
};

const PAGE_SIZE: usize = 8;
const SEQUENCE_LENGTH: usize = 64;

fn deferred(scheduler: &Rc<ManualScheduler>, policy: SettlePolicy) -> DeferredTasks {
    let config = SettleConfig {
        policy,
        ..Default::default()
    };
    DeferredTasks::new(scheduler.clone(), config)
}

fn random_call<B: Bank>(rng: &mut fastrand::Rng, bank: &B) {
    let position = rng.usize(0..64);
    match rng.usize(0..16) {
        0 => bank.scroll_backwards(),
        1 => bank.scroll_forwards(),
        2 => bank.scroll_page_backwards(),
        3 => bank.scroll_page_forwards(),
        4 => bank.scroll_to(position, rng.bool()),
        5 => bank.select_item_at_position(position),
        6 => bank.select_next_item(),
        7 => bank.select_previous_item(),
        8 => bank.select_next_page(),
        9 => bank.select_previous_page(),
        10 => bank.enable_observers(rng.bool()),
        11 => {
            bank.item(position % bank.page_size());
        }
        12 => {
            bank.selected_item();
        }
        13 => {
            bank.can_scroll_page_forwards();
        }
        14 => {
            bank.activate();
        }
        _ => {
            bank.selected_item_position();
        }
    }
}

fn assert_inert<B: Bank + ?Sized>(bank: &B, context: &str) {
    assert_eq!(bank.page_size(), PAGE_SIZE, "{context}");
    assert_eq!(bank.item_count(), 0, "{context}");
    assert_eq!(bank.scroll_position(), None, "{context}");
    assert!(!bank.can_scroll_page_backwards(), "{context}");
    assert!(!bank.can_scroll_page_forwards(), "{context}");
    assert_eq!(bank.selected_item(), None, "{context}");
    assert_eq!(bank.selected_item_index(), None, "{context}");
    assert_eq!(bank.selected_item_position(), None, "{context}");
    for index in 0..PAGE_SIZE {
        assert_eq!(bank.item(index), Item::empty(index), "{context}");
    }
}

fn fuzz<B: Bank>(name: &str, seed: u64, scheduler: &Rc<ManualScheduler>, bank: &B) {
    let mut rng = fastrand::Rng::with_seed(seed);
    assert_inert(bank, name);
    for step in 0..SEQUENCE_LENGTH {
        random_call(&mut rng, bank);
        if rng.bool() {
            scheduler.advance(Duration::from_millis(rng.u64(0..200)));
        }
        assert_inert(bank, &format!("{name} step {step}"));
    }
    scheduler.advance(Duration::from_secs(1));
    assert_eq!(scheduler.pending(), 0, "{name}");
    assert_inert(bank, name);
}

#[test]
fn test_unbound_banks_stay_inert() {
    for (seed, policy) in [(7, SettlePolicy::Queue), (11, SettlePolicy::Coalesce)] {
        let scheduler = Rc::new(ManualScheduler::new());
        let deferred = deferred(&scheduler, policy);

        let plain = WindowedBank::unbound(PAGE_SIZE, deferred.clone()).unwrap();
        fuzz("delegating", seed, &scheduler, &plain);

        let pages = WindowedBank::new(NameArrayBinding::new(None, PAGE_SIZE), deferred.clone()).unwrap();
        fuzz("name array", seed, &scheduler, &pages);

        let pool = WindowedBank::new(FlatBinding::new(None, PAGE_SIZE, 4), deferred.clone()).unwrap();
        fuzz("flat", seed, &scheduler, &pool);

        let channels = ChannelBank::new(&ChannelSource::default(), PAGE_SIZE, 2, 4, deferred.clone()).unwrap();
        fuzz("channel", seed, &scheduler, &channels);
        assert_eq!(channels.selected_color_entry(), ColorEntry::Off);
        assert!(!channels.can_edit_send(0));
        assert_eq!(channels.edit_send_name(1), "");
        channels.stop();
        channels.clear_muted_pads();

        let tracks = TrackBank::new(&ChannelSource::default(), None, PAGE_SIZE, 2, 4, deferred.clone()).unwrap();
        fuzz("track", seed, &scheduler, &tracks);
        tracks.add_channel(
            ChannelType::Audio,
            NewChannel {
                name: Some("Vox".into()),
                ..Default::default()
            },
        );
        assert!(!tracks.has_record_armed());
        assert!(!tracks.is_record_armed(3));

        let scenes = SceneBank::new(
            WindowedBank::unbound(PAGE_SIZE, deferred.clone()).unwrap(),
            Some(WindowedBank::unbound(PAGE_SIZE, deferred.clone()).unwrap()),
        );
        fuzz("scene", seed, &scheduler, &scenes);
        scenes.select_item(3);
        scenes.stop();

        let effects = EffectTrackBank::new(
            TrackBank::new(&ChannelSource::default(), None, PAGE_SIZE, 0, 0, deferred.clone()).unwrap(),
            plain.clone(),
        );
        fuzz("effect track", seed, &scheduler, &effects);

        let markers = MarkerBank::new(None, None, None, PAGE_SIZE, 100, deferred.clone()).unwrap();
        fuzz("marker", seed, &scheduler, &markers);
        assert!(markers.shadow().iter().all(|entry| !entry.exists));
    }
}

#[test]
#[should_panic(expected = "window slot 8 out of range")]
fn test_item_outside_window_panics() {
    let scheduler = Rc::new(ManualScheduler::new());
    let bank = WindowedBank::unbound(PAGE_SIZE, deferred(&scheduler, SettlePolicy::Queue)).unwrap();
    bank.item(PAGE_SIZE);
}
