pub mod api;
pub mod draw;
pub mod events;
pub mod input;
pub mod providers;
pub mod state;

pub use api::NetEvent;
pub use draw::render_to_buffer;
pub use events::{apply_net_event, run};
pub use input::{handle_text_input_key, TextInput};
pub use providers::Provider;
pub use state::{App, Focus, Screen, SettingsFocus};
