use adw::Application;
use adw::prelude::*;
use gtk4 as gtk;
use std::cell::RefCell;
use std::rc::Rc;

use crate::api::client::ApiClient;
use crate::api::events::{self, PushEvent};
use crate::api::models::ChatMessage;
use crate::app::AppState;
use crate::channel::{DeliveryChannel, POLL_INTERVAL};
use crate::conversation::Conversation;

pub fn show_main_window(app: &Application, state: AppState) {
    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title("Brain Bot")
        .default_width(960)
        .default_height(640)
        .build();

    let overlay = adw::ToastOverlay::new();

    let split = adw::Flap::builder()
        .reveal_flap(true)
        .locked(true)
        .modal(false)
        .build();

    let sidebar = Rc::new(crate::ui::sidebar::AgentSidebar::new());
    split.set_flap(Some(&sidebar.widget()));

    let chat = Rc::new(crate::ui::chat_view::ChatView::new());
    split.set_content(Some(&chat.widget()));

    overlay.set_child(Some(&split));

    let container = gtk::Box::new(gtk::Orientation::Vertical, 0);
    let header = adw::HeaderBar::new();
    let title = gtk::Label::new(Some("Brain Bot"));
    header.set_title_widget(Some(&title));

    let status = gtk::Label::new(Some("connecting…"));
    status.add_css_class("dim-label");
    header.pack_start(&status);

    let password_btn = gtk::Button::with_label("Password");
    let logout_btn = gtk::Button::with_label("Log Out");
    header.pack_end(&logout_btn);
    header.pack_end(&password_btn);

    container.append(&header);
    container.append(&overlay);
    window.set_content(Some(&container));
    window.present();

    let client = ApiClient::with_token(&state.base_url, state.token.clone());
    let conversation = Rc::new(RefCell::new(Conversation::new()));
    let channel = Rc::new(RefCell::new(DeliveryChannel::new()));
    let selected_agent = Rc::new(RefCell::new(None::<String>));
    let poll_source = Rc::new(RefCell::new(None::<glib::SourceId>));
    let push_task = Rc::new(RefCell::new(None::<tokio::task::JoinHandle<()>>));

    // Tearing the screen down has to stop both delivery paths, otherwise a
    // leaked callback would keep appending to a dead view.
    let cleanup: Rc<dyn Fn()> = {
        let poll_source = poll_source.clone();
        let push_task = push_task.clone();
        Rc::new(move || {
            if let Some(id) = poll_source.borrow_mut().take() {
                id.remove();
            }
            if let Some(task) = push_task.borrow_mut().take() {
                task.abort();
            }
        })
    };
    {
        let cleanup = cleanup.clone();
        window.connect_destroy(move |_| (cleanup)());
    }

    {
        let selected_agent = selected_agent.clone();
        sidebar.connect_agent_selected(move |agent| *selected_agent.borrow_mut() = agent);
    }

    // Single append path for everything that lands in the list: cache,
    // render, then refresh the pending indicator from the model.
    let apply_message: Rc<dyn Fn(ChatMessage)> = {
        let conversation = conversation.clone();
        let chat = chat.clone();
        Rc::new(move |msg: ChatMessage| {
            if let Err(err) = crate::storage::append_message(&msg) {
                log::debug!("message cache write failed: {err}");
            }
            chat.push_message(&msg);
            conversation.borrow_mut().push(msg);
            let conv = conversation.borrow();
            chat.set_pending(conv.awaiting().map(|a| a.agent.as_deref()));
        })
    };

    // Cached copy first so the window is not empty while we fetch.
    match crate::storage::recent_messages(200) {
        Ok(cached) if !cached.is_empty() => {
            conversation.borrow_mut().load_history(cached);
            chat.set_messages(conversation.borrow().messages());
        }
        Ok(_) => {}
        Err(err) => log::debug!("message cache read failed: {err}"),
    }

    {
        let client_for_history = client.clone();
        let rx = crate::utils::run_async_to_main(async move { client_for_history.history().await });
        let conversation = conversation.clone();
        let chat = chat.clone();
        let overlay2 = overlay.clone();
        let app2 = app.clone();
        let cleanup2 = cleanup.clone();
        rx.attach(None, move |res| {
            match res {
                Ok(entries) => {
                    let msgs: Vec<ChatMessage> =
                        entries.into_iter().map(ChatMessage::from).collect();
                    if let Err(err) = crate::storage::replace_history(&msgs) {
                        log::debug!("message cache refresh failed: {err}");
                    }
                    conversation.borrow_mut().load_history(msgs);
                    chat.set_messages(conversation.borrow().messages());
                }
                Err(err) if err.is_auth_failure() => {
                    (cleanup2)();
                    crate::app::handle_auth_failure(&app2);
                }
                Err(err) => {
                    log::warn!("history fetch failed: {err}");
                    overlay2.add_toast(adw::Toast::new("Failed to load conversation history."));
                }
            }
            glib::ControlFlow::Continue
        });
    }

    // Fallback pull loop, started once the push channel is written off.
    // Each tick fetches whatever piled up; a failed tick is logged and the
    // next one simply tries again.
    let start_polling: Rc<dyn Fn()> = {
        let client = client.clone();
        let apply_message = apply_message.clone();
        let poll_source = poll_source.clone();
        let app2 = app.clone();
        let cleanup = cleanup.clone();
        Rc::new(move || {
            if poll_source.borrow().is_some() {
                return;
            }
            let client = client.clone();
            let apply_message = apply_message.clone();
            let app2 = app2.clone();
            let cleanup = cleanup.clone();
            let id = glib::timeout_add_local(POLL_INTERVAL, move || {
                let client = client.clone();
                let rx = crate::utils::run_async_to_main(async move { client.pending().await });
                let apply_message = apply_message.clone();
                let app3 = app2.clone();
                let cleanup = cleanup.clone();
                rx.attach(None, move |res| {
                    match res {
                        Ok(responses) => {
                            for response in responses {
                                (apply_message)(ChatMessage::from(response));
                            }
                        }
                        Err(err) if err.is_auth_failure() => {
                            (cleanup)();
                            crate::app::handle_auth_failure(&app3);
                        }
                        Err(err) => log::warn!("pending fetch failed: {err}"),
                    }
                    glib::ControlFlow::Continue
                });
                glib::ControlFlow::Continue
            });
            *poll_source.borrow_mut() = Some(id);
        })
    };

    match client.stream_request() {
        Ok(request) => {
            let (tx, rx) = crate::utils::glib_channel::<PushEvent>();
            *push_task.borrow_mut() = Some(events::spawn_push_stream(request, tx));
            let channel = channel.clone();
            let status = status.clone();
            let apply_message = apply_message.clone();
            let start_polling = start_polling.clone();
            rx.attach(None, move |event| {
                match event {
                    PushEvent::Established => {
                        channel.borrow_mut().on_established();
                        status.set_text(channel.borrow().describe());
                    }
                    PushEvent::Message(response) => {
                        if channel.borrow().accepts_push() {
                            (apply_message)(ChatMessage::from(response));
                        } else {
                            log::debug!("dropping push event received after downgrade");
                        }
                    }
                    PushEvent::Lost => {
                        if channel.borrow_mut().on_push_failure() {
                            status.set_text(channel.borrow().describe());
                            (start_polling)();
                        }
                    }
                }
                glib::ControlFlow::Continue
            });
        }
        Err(err) => {
            // No usable stream request, no push: go straight to polling.
            log::warn!("push channel unavailable: {err}");
            channel.borrow_mut().on_push_failure();
            status.set_text(channel.borrow().describe());
            (start_polling)();
        }
    }

    {
        let client = client.clone();
        let selected_agent = selected_agent.clone();
        let apply_message = apply_message.clone();
        let app2 = app.clone();
        let cleanup = cleanup.clone();
        chat.connect_send(move |text| {
            let agent = selected_agent.borrow().clone();
            // Optimistic echo before the enqueue call goes out.
            (apply_message)(ChatMessage::sent(text.clone(), agent.clone()));
            let client = client.clone();
            let rx = crate::utils::run_async_to_main(async move {
                client.send_message(&text, agent.as_deref()).await
            });
            let apply_message = apply_message.clone();
            let app3 = app2.clone();
            let cleanup = cleanup.clone();
            rx.attach(None, move |res| {
                match res {
                    Ok(()) => {}
                    Err(err) if err.is_auth_failure() => {
                        (cleanup)();
                        crate::app::handle_auth_failure(&app3);
                    }
                    Err(err) => {
                        // Nothing reached the queue; the user has to resend.
                        (apply_message)(ChatMessage::failure(format!("Message not sent: {err}")));
                    }
                }
                glib::ControlFlow::Continue
            });
        });
    }

    {
        let window2 = window.clone();
        let overlay2 = overlay.clone();
        let client = client.clone();
        let app2 = app.clone();
        let cleanup = cleanup.clone();
        password_btn.connect_clicked(move |_| {
            let dialog = gtk::Dialog::builder()
                .title("Change Password")
                .transient_for(&window2)
                .modal(true)
                .build();
            let content = gtk::Box::new(gtk::Orientation::Vertical, 12);
            content.set_margin_top(12);
            content.set_margin_bottom(12);
            content.set_margin_start(12);
            content.set_margin_end(12);

            let current_entry = gtk::PasswordEntry::new();
            current_entry.set_placeholder_text(Some("Current password"));
            let new_entry = gtk::PasswordEntry::new();
            new_entry.set_placeholder_text(Some("New password"));
            content.append(&current_entry);
            content.append(&new_entry);

            dialog.content_area().append(&content);
            let _ = dialog.add_button("Cancel", gtk::ResponseType::Cancel);
            let ok_btn = dialog.add_button("Change", gtk::ResponseType::Ok);
            ok_btn.add_css_class("suggested-action");
            dialog.set_default_response(gtk::ResponseType::Ok);

            let overlay3 = overlay2.clone();
            let client = client.clone();
            let app3 = app2.clone();
            let cleanup = cleanup.clone();
            dialog.connect_response(move |dlg, resp| {
                if resp == gtk::ResponseType::Ok {
                    let current = current_entry.text().to_string();
                    let new_pass = new_entry.text().to_string();
                    if current.is_empty() || new_pass.is_empty() {
                        overlay3.add_toast(adw::Toast::new("Please fill in both passwords."));
                        return;
                    }
                    let client = client.clone();
                    let rx = crate::utils::run_async_to_main(async move {
                        client.change_password(&current, &new_pass).await
                    });
                    let overlay4 = overlay3.clone();
                    let app4 = app3.clone();
                    let cleanup = cleanup.clone();
                    rx.attach(None, move |res| {
                        match res {
                            Ok(()) => overlay4.add_toast(adw::Toast::new("Password changed.")),
                            Err(err) if err.is_auth_failure() => {
                                (cleanup)();
                                crate::app::handle_auth_failure(&app4);
                            }
                            Err(err) => overlay4.add_toast(adw::Toast::new(&format!(
                                "Password change failed: {err}"
                            ))),
                        }
                        glib::ControlFlow::Continue
                    });
                }
                dlg.close();
            });

            dialog.present();
        });
    }

    {
        let app2 = app.clone();
        let cleanup = cleanup.clone();
        logout_btn.connect_clicked(move |_| {
            (cleanup)();
            crate::app::logout(&app2);
        });
    }
}
