use sagechat_dispatch::view::message_time;
use sagechat_dispatch::{
    ChatEndpoint, Composer, DispatchError, Dispatcher, QuoteSelection, SelectionMenu,
    SelectionRange, SpeechAction, SpeechCapability, SpeechToggle, Step, Timer,
};
use sagechat_store::ChatSessionStore;
use sagechat_types::{ChatMessage, Role};
use std::cell::RefCell;
use std::fmt::Display;
use std::rc::Rc;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, Event, HtmlButtonElement, KeyboardEvent, Node};

use crate::dom;
use crate::endpoint::{FetchEndpoint, GlooTimer};
use crate::sidebar;
use crate::speech::BrowserSpeech;
use crate::storage::LocalStorage;
use crate::utils;

fn js_err(err: impl Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

struct ChatState {
    store: ChatSessionStore<LocalStorage>,
    composer: Composer,
    dispatcher: Dispatcher,
}

pub struct ChatApp {
    document: Document,
    state: RefCell<ChatState>,
    endpoint: FetchEndpoint,
    timer: GlooTimer,
    speech: Option<BrowserSpeech>,
    speech_toggle: SpeechToggle,
    selection: QuoteSelection,
    menu: RefCell<SelectionMenu>,
}

impl ChatApp {
    pub fn new() -> Result<Self, JsValue> {
        let document = crate::document()?;

        let store = match ChatSessionStore::load(LocalStorage::open()?) {
            Ok(store) => store,
            Err(e) => {
                log::error!("Failed to load chat histories: {}", e);
                if let Ok(container) = dom::get_element_by_id(&document, "messagesContainer") {
                    container.set_text_content(Some(&format!("无法读取保存的对话：{}", e)));
                }
                return Err(js_err(e));
            }
        };

        let speech = BrowserSpeech::open();
        if speech.is_none() {
            log::warn!("Speech synthesis is not available");
        }

        Ok(Self {
            document,
            state: RefCell::new(ChatState {
                store,
                composer: Composer::new(),
                dispatcher: Dispatcher::default(),
            }),
            endpoint: FetchEndpoint::new(),
            timer: GlooTimer,
            speech,
            speech_toggle: SpeechToggle::default(),
            selection: QuoteSelection,
            menu: RefCell::new(SelectionMenu::default()),
        })
    }

    pub fn start(self) -> Result<(), JsValue> {
        self.state
            .borrow_mut()
            .store
            .ensure_active_chat()
            .map_err(js_err)?;

        let app = Rc::new(self);
        app.setup_message_input()?;
        app.setup_sidebar()?;
        app.setup_message_actions()?;
        app.setup_quote_bar()?;
        app.setup_selection_menu()?;
        app.render()?;

        Ok(())
    }

    // ===== Event wiring

    fn setup_message_input(self: &Rc<Self>) -> Result<(), JsValue> {
        let input = dom::get_textarea_by_id(&self.document, "messageInput")?;

        let app = self.clone();
        dom::add_listener(&input, "input", move |_| {
            if let Err(e) = app.sync_input() {
                log::error!("Failed to read input: {:?}", e);
            }
        })?;

        let app = self.clone();
        dom::add_listener(&input, "keydown", move |event| {
            let Some(key_event) = event.dyn_ref::<KeyboardEvent>() else {
                return;
            };
            if key_event.key() == "Enter" && !key_event.shift_key() {
                event.prevent_default();
                app.clone().spawn_submit();
            }
        })?;

        let send_btn = dom::get_element_by_id(&self.document, "sendButton")?;
        let app = self.clone();
        dom::add_listener(&send_btn, "click", move |_| app.clone().spawn_submit())?;

        Ok(())
    }

    fn setup_sidebar(self: &Rc<Self>) -> Result<(), JsValue> {
        let new_btn = dom::get_element_by_id(&self.document, "newChatButton")?;
        let app = self.clone();
        dom::add_listener(&new_btn, "click", move |_| {
            let result = app.state.borrow_mut().store.create_chat().map_err(js_err);
            if let Err(e) = result.and_then(|_| app.render()) {
                log::error!("Failed to create chat: {:?}", e);
            }
        })?;

        let list = dom::get_element_by_id(&self.document, "historyList")?;
        let app = self.clone();
        dom::add_listener(&list, "click", move |event| {
            let Some((element, action)) = dom::action_target(&event) else {
                return;
            };
            let Some(id) = dom::closest_data_id(&element) else {
                return;
            };
            event.stop_propagation();
            if let Err(e) = app.history_action(&action, &id) {
                log::error!("History action {} failed: {:?}", action, e);
            }
        })
    }

    fn setup_message_actions(self: &Rc<Self>) -> Result<(), JsValue> {
        let container = dom::get_element_by_id(&self.document, "messagesContainer")?;

        let app = self.clone();
        dom::add_listener(&container, "click", move |event| {
            if let Some((element, action)) = dom::action_target(&event) {
                if action == "speak" {
                    if let Some(id) = dom::closest_data_id(&element) {
                        app.toggle_speech(&id);
                    }
                }
            }
        })?;

        let app = self.clone();
        dom::add_listener(&container, "mouseup", move |event| {
            if let Err(e) = app.capture_selection(&event) {
                log::error!("Failed to read selection: {:?}", e);
            }
        })
    }

    fn setup_quote_bar(self: &Rc<Self>) -> Result<(), JsValue> {
        let clear = dom::get_element_by_id(&self.document, "quoteClear")?;
        let app = self.clone();
        dom::add_listener(&clear, "click", move |_| {
            app.state.borrow_mut().composer.clear_quote();
            if let Err(e) = app.render_composer() {
                log::error!("Failed to render quote: {:?}", e);
            }
        })
    }

    /// Speak/quote popover over a selection; closes on any outside press
    /// unless it is still reading aloud.
    fn setup_selection_menu(self: &Rc<Self>) -> Result<(), JsValue> {
        let popover = dom::get_element_by_id(&self.document, "selectionMenu")?;

        let app = self.clone();
        dom::add_listener(&popover, "click", move |event| {
            let Some((element, action)) = dom::action_target(&event) else {
                return;
            };
            if let Err(e) = app.selection_action(&action, &element) {
                log::error!("Selection action {} failed: {:?}", action, e);
            }
        })?;

        let body = self
            .document
            .body()
            .ok_or_else(|| JsValue::from_str("No body element"))?;
        let app = self.clone();
        dom::add_listener(&body, "mousedown", move |event| {
            let inside = event
                .target()
                .and_then(|t| t.dyn_into::<Node>().ok())
                .map(|node| popover.contains(Some(&node)))
                .unwrap_or(false);
            let speaking = app.speech.as_ref().map(|s| s.is_speaking()).unwrap_or(false);
            if !inside && !speaking {
                app.close_selection_menu();
            }
        })
    }

    // ===== Actions

    fn sync_input(&self) -> Result<(), JsValue> {
        let input = dom::get_textarea_by_id(&self.document, "messageInput")?;
        self.state.borrow_mut().composer.set_input(input.value());
        self.render_composer()
    }

    fn history_action(&self, action: &str, id: &str) -> Result<(), JsValue> {
        let window = crate::window()?;
        match action {
            "select" => {
                self.state.borrow_mut().store.select_chat(id).map_err(js_err)?;
            }
            "star" => {
                self.state.borrow_mut().store.toggle_star(id).map_err(js_err)?;
            }
            "rename" => {
                let current = self
                    .state
                    .borrow()
                    .store
                    .get(id)
                    .map(|h| h.title.clone())
                    .unwrap_or_default();
                if let Some(title) = window.prompt_with_message_and_default("重命名对话", &current)? {
                    self.state.borrow_mut().store.rename_chat(id, &title).map_err(js_err)?;
                }
            }
            "delete" => {
                if window.confirm_with_message("确定要删除这个对话吗？")? {
                    self.state.borrow_mut().store.delete_chat(id).map_err(js_err)?;
                }
            }
            "export" => {
                let transcript = self.state.borrow().store.export_chat(id);
                if let Some(transcript) = transcript {
                    utils::download_text(&transcript.file_name, &transcript.content)?;
                }
                return Ok(());
            }
            other => {
                log::warn!("Unknown history action: {}", other);
                return Ok(());
            }
        }
        self.render()
    }

    fn toggle_speech(&self, message_id: &str) {
        let Some(speech) = &self.speech else {
            return;
        };
        let text = self
            .state
            .borrow()
            .store
            .messages()
            .iter()
            .find(|m| m.id == message_id)
            .map(|m| m.content.clone());
        if let Some(text) = text {
            let action = self.speech_toggle.toggle(speech, &text);
            log::debug!("Speech {:?} for message {}", action, message_id);
        }
    }

    fn capture_selection(&self, event: &Event) -> Result<(), JsValue> {
        let Some(selection) = crate::window()?.get_selection()? else {
            return Ok(());
        };
        let text: String = selection.to_string().into();

        let message_id = event
            .target()
            .and_then(|t| t.dyn_into::<Element>().ok())
            .and_then(|e| dom::closest_data_id(&e));
        let Some(message_id) = message_id else {
            return Ok(());
        };

        if !self.menu.borrow_mut().open(SelectionRange { message_id, text }) {
            self.close_selection_menu();
            return Ok(());
        }

        let popover = dom::get_html_element_by_id(&self.document, "selectionMenu")?;
        if selection.range_count() > 0 {
            let rect = selection.get_range_at(0)?.get_bounding_client_rect();
            let style = popover.style();
            style.set_property("left", &format!("{}px", rect.left() + rect.width() / 2.0 - 50.0))?;
            style.set_property("top", &format!("{}px", rect.top() - 50.0))?;
        }
        self.set_speak_label("🔊")?;
        dom::show_element(&popover);
        Ok(())
    }

    fn selection_action(&self, action: &str, button: &Element) -> Result<(), JsValue> {
        match action {
            "speak-selection" => {
                let Some(speech) = &self.speech else {
                    button.set_text_content(Some("❌"));
                    return Ok(());
                };
                let played = self.menu.borrow().speak(&self.speech_toggle, speech);
                let label = match played {
                    Some(SpeechAction::Started) => "⏸",
                    _ => "🔊",
                };
                button.set_text_content(Some(label));
            }
            "quote-selection" => {
                let quoted = {
                    let mut state = self.state.borrow_mut();
                    self.menu.borrow_mut().quote(&self.selection, &mut state.composer)
                };
                self.close_selection_menu();
                if quoted {
                    self.render_composer()?;
                }
            }
            other => log::warn!("Unknown selection action: {}", other),
        }
        Ok(())
    }

    fn set_speak_label(&self, label: &str) -> Result<(), JsValue> {
        if let Some(button) = self
            .document
            .query_selector("#selectionMenu [data-action=\"speak-selection\"]")?
        {
            button.set_text_content(Some(label));
        }
        Ok(())
    }

    fn close_selection_menu(&self) {
        self.menu.borrow_mut().dismiss();
        if let Ok(popover) = dom::get_html_element_by_id(&self.document, "selectionMenu") {
            dom::hide_element(&popover);
        }
    }

    fn spawn_submit(self: Rc<Self>) {
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(e) = self.submit().await {
                log::error!("Failed to send message: {:?}", e);
            }
        });
    }

    /// Send the composed message, then redraw whatever state the
    /// dispatcher ended in, including after a storage error.
    async fn submit(&self) -> Result<(), JsValue> {
        let result = self.drive_submission().await;
        self.render()?;
        result
    }

    /// Drive one submission through the dispatcher without holding the
    /// state borrow across any await.
    async fn drive_submission(&self) -> Result<(), JsValue> {
        let input = dom::get_textarea_by_id(&self.document, "messageInput")?;

        let begun = {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            state.composer.set_input(input.value());
            state.dispatcher.begin(&mut state.store, &mut state.composer)
        };
        let mut submission = match begun {
            Ok(submission) => submission,
            Err(DispatchError::Rejected(rejection)) => {
                log::debug!("Submission rejected: {:?}", rejection);
                return Ok(());
            }
            Err(e) => return Err(js_err(e)),
        };

        input.set_value("");
        self.render()?;

        loop {
            let result = self.endpoint.send(&submission.payload).await;

            let retry = {
                let mut guard = self.state.borrow_mut();
                let state = &mut *guard;
                match result {
                    Ok(reply) => {
                        state
                            .dispatcher
                            .on_success(&mut state.store, submission, reply)
                            .map_err(js_err)?;
                        None
                    }
                    Err(error) => {
                        log::warn!("Send failed: {}", error);
                        match state
                            .dispatcher
                            .on_failure(&mut state.store, submission, &error)
                            .map_err(js_err)?
                        {
                            Step::Retry { submission, delay } => Some((submission, delay)),
                            Step::GaveUp(_) => None,
                        }
                    }
                }
            };

            let Some((next, delay)) = retry else {
                break;
            };
            self.render_composer()?;
            self.timer.sleep(delay).await;
            self.state.borrow_mut().dispatcher.resume(&next);
            submission = next;
        }

        Ok(())
    }

    // ===== Rendering

    fn render(&self) -> Result<(), JsValue> {
        let summaries = self.state.borrow().store.summaries();
        sidebar::render_histories(&self.document, &summaries)?;
        self.render_messages()?;
        self.render_composer()
    }

    fn render_messages(&self) -> Result<(), JsValue> {
        let container = dom::get_element_by_id(&self.document, "messagesContainer")?;
        dom::clear_element(&container);

        let state = self.state.borrow();
        if let Some(chat) = state.store.active_chat() {
            let title = dom::get_element_by_id(&self.document, "chatTitle")?;
            title.set_text_content(Some(&chat.title));
        }
        for message in state.store.messages() {
            let element = self.render_message(message)?;
            container.append_child(&element)?;
        }

        dom::scroll_to_bottom(&container);
        Ok(())
    }

    fn render_message(&self, message: &ChatMessage) -> Result<Element, JsValue> {
        let msg_div = self.document.create_element("div")?;
        msg_div.set_class_name(&format!("message {}", message.role));
        msg_div.set_attribute("data-id", &message.id)?;

        let speak_button = if message.role == Role::Assistant && self.speech.is_some() {
            r#"<button class="speak-button" data-action="speak" title="朗读">🔊</button>"#
        } else {
            ""
        };
        let html = format!(
            concat!(
                r#"<div class="message-content">{}</div>"#,
                r#"<div class="message-meta"><span class="message-time">{}</span>{}</div>"#,
            ),
            utils::render_paragraphs(&message.content),
            message_time(&message.timestamp),
            speak_button
        );
        msg_div.set_inner_html(&html);

        Ok(msg_div)
    }

    fn render_composer(&self) -> Result<(), JsValue> {
        let state = self.state.borrow();

        let quote_bar = dom::get_html_element_by_id(&self.document, "quoteBar")?;
        let quote_text = dom::get_element_by_id(&self.document, "quoteText")?;
        match state.composer.quote() {
            Some(quote) => {
                quote_text.set_text_content(Some(quote.as_str()));
                dom::show_element(&quote_bar);
            }
            None => {
                quote_text.set_text_content(None);
                dom::hide_element(&quote_bar);
            }
        }

        let typing = dom::get_html_element_by_id(&self.document, "typingIndicator")?;
        if state.dispatcher.is_busy() {
            dom::show_element(&typing);
        } else {
            dom::hide_element(&typing);
        }

        let send_btn = dom::get_element_by_id(&self.document, "sendButton")?
            .dyn_into::<HtmlButtonElement>()?;
        send_btn.set_disabled(state.dispatcher.is_busy() || !state.composer.can_submit());

        Ok(())
    }
}
