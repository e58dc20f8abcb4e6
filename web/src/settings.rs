use crate::theme::Theme;
use crate::utils::*;
use parejitas_core as game;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use yew::prelude::*;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct Settings {
    pub board_size: game::Coord,
    pub mismatch_wait_ms: u32,
}

impl Settings {
    pub(crate) fn game_config(&self) -> game::Result<game::GameConfig> {
        game::GameConfig::new(
            self.board_size,
            Duration::from_millis(self.mismatch_wait_ms.into()),
        )
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            board_size: game::GameConfig::DEFAULT_SIZE,
            mismatch_wait_ms: game::GameConfig::DEFAULT_MISMATCH_WAIT.as_millis() as u32,
        }
    }
}

impl StorageKey for Settings {
    const KEY: &'static str = "parejitas:settings";
}

#[derive(Properties, PartialEq)]
pub(crate) struct SettingsProps {
    #[prop_or_default]
    pub open: bool,
    pub on_close: Callback<()>,
}

#[function_component]
pub(crate) fn SettingsView(props: &SettingsProps) -> Html {
    let draft = use_state(Settings::local_or_default);

    let on_size_change = {
        let draft = draft.clone();
        Callback::from(move |e: Event| {
            let Some(select) = e.target_dyn_into::<web_sys::HtmlSelectElement>() else {
                return;
            };
            if let Ok(board_size) = select.value().parse() {
                draft.set(Settings {
                    board_size,
                    ..*draft
                });
            }
        })
    };

    let on_wait_input = {
        let draft = draft.clone();
        Callback::from(move |e: InputEvent| {
            let Some(input) = e.target_dyn_into::<web_sys::HtmlInputElement>() else {
                return;
            };
            if let Ok(mismatch_wait_ms) = input.value().parse() {
                draft.set(Settings {
                    mismatch_wait_ms,
                    ..*draft
                });
            }
        })
    };

    let apply = {
        let draft = draft.clone();
        let on_close = props.on_close.clone();
        Callback::from(move |_: MouseEvent| {
            (*draft).local_save();
            on_close.emit(());
        })
    };

    let cancel = {
        let draft = draft.clone();
        let on_close = props.on_close.clone();
        Callback::from(move |_: MouseEvent| {
            draft.set(Settings::local_or_default());
            on_close.emit(());
        })
    };

    let theme_link = |label: &'static str, theme: Option<Theme>| {
        let onclick = Callback::from(move |e: MouseEvent| {
            e.prevent_default();
            Theme::apply(theme);
        });
        html! {
            <li><a href="#" {onclick}>{label}</a></li>
        }
    };

    html! {
        <dialog id="settings" open={props.open}>
            <article>
                <h2>{"Settings"}</h2>
                <label>
                    {"Board"}
                    <select onchange={on_size_change}>
                        {
                            // only sides that deal complete pairs
                            for [2u8, 4, 6, 8].into_iter().map(|size| html! {
                                <option value={size.to_string()} selected={draft.board_size == size}>
                                    {format!("{size} × {size}")}
                                </option>
                            })
                        }
                    </select>
                </label>
                <label>
                    {"Mismatch wait (ms)"}
                    <input
                        type="number"
                        min="100"
                        step="100"
                        value={draft.mismatch_wait_ms.to_string()}
                        oninput={on_wait_input}
                    />
                </label>
                <ul>
                    { theme_link("Teal", Some(Theme::Teal)) }
                    { theme_link("Light", Some(Theme::Light)) }
                    { theme_link("Dark", Some(Theme::Dark)) }
                    { theme_link("Auto", None) }
                </ul>
                <footer>
                    <button type="reset" onclick={cancel}>{"Cancel"}</button>
                    <button onclick={apply}>{"Apply"}</button>
                </footer>
            </article>
        </dialog>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_yield_a_valid_config() {
        let config = Settings::default().game_config().unwrap();

        assert_eq!(config.size, 6);
        assert_eq!(config.mismatch_wait, Duration::from_millis(1000));
    }

    #[test]
    fn odd_board_settings_are_rejected() {
        let settings = Settings {
            board_size: 5,
            mismatch_wait_ms: 1000,
        };

        assert_eq!(settings.game_config(), Err(game::GameError::OddCellCount));
    }
}
