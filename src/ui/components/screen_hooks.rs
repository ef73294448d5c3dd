use crate::playback::{PlaybackEvent, PlaybackState};
use crate::progress::ProgressState;
use crate::screen::{ScreenController, ScreenState};
use crate::AppContext;
use dioxus::prelude::*;
use tokio::sync::mpsc::UnboundedReceiver;

/// Hook to access the screen controller
pub fn use_screen_controller() -> ScreenController {
    let context = use_context::<AppContext>();
    context.screen.clone()
}

/// Reactive mirror of the screen, progress and player state
#[derive(Clone, Copy)]
pub struct SharedScreenState {
    pub screen: Signal<ScreenState>,
    pub progress: Signal<ProgressState>,
    pub playback: Signal<Option<PlaybackState>>,
    pub notice: Signal<Option<String>>,
    player_epoch: Signal<u64>,
}

/// Provider component that keeps `SharedScreenState` in step with the
/// controllers' subscription channels
#[component]
pub fn ScreenStateProvider(children: Element) -> Element {
    let screen_controller = use_screen_controller();
    let initial_screen = screen_controller.snapshot();
    let initial_progress = screen_controller.progress().state();

    let shared = SharedScreenState {
        screen: use_signal(|| initial_screen),
        progress: use_signal(|| initial_progress),
        playback: use_signal(|| None),
        notice: use_signal(|| None),
        player_epoch: use_signal(|| 0),
    };
    use_context_provider(|| shared);

    use_effect({
        let screen_controller = screen_controller.clone();
        let mut progress_signal = shared.progress;
        move || {
            let screen_controller = screen_controller.clone();
            spawn(async move {
                let mut progress_rx = screen_controller.progress().subscribe();
                while let Some(state) = progress_rx.recv().await {
                    progress_signal.set(state);
                }
            });
        }
    });

    use_effect(move || {
        let screen_controller = screen_controller.clone();
        let mut screen_signal = shared.screen;
        let mut playback_signal = shared.playback;
        let mut epoch_signal = shared.player_epoch;
        spawn(async move {
            let mut screen_rx = screen_controller.subscribe();
            while let Some(state) = screen_rx.recv().await {
                if state.player_epoch != *epoch_signal.peek() {
                    epoch_signal.set(state.player_epoch);
                    match screen_controller.player() {
                        Some(player) => {
                            playback_signal.set(Some(player.state()));
                            spawn(follow_player(player.subscribe(), state.player_epoch, shared));
                        }
                        None => playback_signal.set(None),
                    }
                }
                screen_signal.set(state);
            }
        });
    });

    rsx! {
        {children}
    }
}

async fn follow_player(
    mut events: UnboundedReceiver<PlaybackEvent>,
    epoch: u64,
    shared: SharedScreenState,
) {
    let SharedScreenState {
        mut playback,
        mut notice,
        player_epoch,
        ..
    } = shared;

    while let Some(event) = events.recv().await {
        // A newer player owns the signals now
        if *player_epoch.peek() != epoch {
            break;
        }
        match event {
            PlaybackEvent::StateChanged { state } => playback.set(Some(state)),
            PlaybackEvent::Notice { message } => notice.set(Some(message)),
        }
    }
}

/// Hook to the shared screen state
pub fn use_screen_state() -> SharedScreenState {
    use_context::<SharedScreenState>()
}
