use adw::Application;
use adw::prelude::*;
use gtk4 as gtk;
use std::rc::Rc;

use crate::api::client::{ApiClient, ApiError};
use crate::app::AppState;

enum LoginError {
    Unreachable(ApiError),
    Rejected(String),
}

pub fn show_login_window(app: &Application, state: AppState) {
    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title("Brain Bot Login")
        .default_width(420)
        .default_height(300)
        .resizable(false)
        .build();

    let toast_overlay = adw::ToastOverlay::new();

    // Root container
    let root = gtk::Box::new(gtk::Orientation::Vertical, 12);
    root.set_margin_top(24);
    root.set_margin_bottom(24);
    root.set_margin_start(24);
    root.set_margin_end(24);

    let title = gtk::Label::new(Some("Sign in to Brain Bot"));
    title.add_css_class("title-2");
    title.set_halign(gtk::Align::Start);
    root.append(&title);

    let server_entry = gtk::Entry::new();
    server_entry.set_placeholder_text(Some("Server URL (e.g. https://bot.example.com)"));
    server_entry.set_hexpand(true);
    if !state.base_url.is_empty() {
        server_entry.set_text(&state.base_url);
    }

    let user_entry = gtk::Entry::new();
    user_entry.set_placeholder_text(Some("Username"));
    user_entry.set_hexpand(true);

    let pass_entry = gtk::PasswordEntry::new();
    pass_entry.set_placeholder_text(Some("Password"));
    pass_entry.set_hexpand(true);

    let form = gtk::Box::new(gtk::Orientation::Vertical, 8);
    form.append(&server_entry);
    form.append(&user_entry);
    form.append(&pass_entry);
    root.append(&form);

    // Status label (small, muted)
    let status = gtk::Label::new(None);
    status.add_css_class("dim-label");
    status.set_halign(gtk::Align::Start);
    root.append(&status);

    let login_btn = gtk::Button::with_label("Sign In");
    login_btn.add_css_class("suggested-action");
    login_btn.set_halign(gtk::Align::End);
    root.append(&login_btn);

    toast_overlay.set_child(Some(&root));
    let container = gtk::Box::new(gtk::Orientation::Vertical, 0);
    let header = adw::HeaderBar::new();
    let header_title = gtk::Label::new(Some("Brain Bot"));
    header.set_title_widget(Some(&header_title));
    container.append(&header);
    container.append(&toast_overlay);
    window.set_content(Some(&container));

    let on_connect = {
        let app = app.clone();
        let window = window.clone();
        let overlay = toast_overlay.clone();
        let server_entry = server_entry.clone();
        let user_entry = user_entry.clone();
        let pass_entry = pass_entry.clone();
        let status = status.clone();
        move || {
            let server_raw = server_entry.text().trim().to_string();
            let username = user_entry.text().trim().to_string();
            let password = pass_entry.text().to_string();
            if server_raw.is_empty() || username.is_empty() || password.is_empty() {
                overlay.add_toast(adw::Toast::new(
                    "Please enter server URL, username and password.",
                ));
                return;
            }
            let url = crate::utils::normalize_url(&server_raw);

            status.set_label("Connecting…");

            let url_for_async = url.clone();
            let username_for_async = username.clone();
            let rx = crate::utils::run_async_to_main(async move {
                let client = ApiClient::new(&url_for_async);
                // Probe first so an unreachable server reads differently
                // from a rejected credential.
                if let Err(err) = client.health().await {
                    return Err(LoginError::Unreachable(err));
                }
                match client.login(&username_for_async, &password).await {
                    Ok(login) => Ok((url_for_async, login)),
                    Err(ApiError::Unauthorized(_)) => {
                        Err(LoginError::Rejected("Incorrect username or password.".into()))
                    }
                    Err(ApiError::Server { detail, .. }) => Err(LoginError::Rejected(detail)),
                    Err(err) => Err(LoginError::Rejected(err.to_string())),
                }
            });

            let status_label = status.clone();
            let app2 = app.clone();
            let window2 = window.clone();
            let overlay2 = overlay.clone();
            rx.attach(None, move |res| {
                match res {
                    Ok((base_url, login)) => {
                        let st = AppState {
                            base_url,
                            username: login.username,
                            token: Some(login.access_token),
                        };
                        if let Err(err) = st.save() {
                            overlay2
                                .add_toast(adw::Toast::new(&format!("Failed to save session: {}", err)));
                        }
                        crate::ui::main_window::show_main_window(&app2, st);
                        window2.close();
                    }
                    Err(LoginError::Unreachable(err)) => {
                        log::warn!("server probe failed: {err}");
                        status_label.set_label("Server unreachable");
                        overlay2.add_toast(adw::Toast::new(
                            "Could not reach the server. Check the URL.",
                        ));
                    }
                    Err(LoginError::Rejected(detail)) => {
                        status_label.set_label("Login failed");
                        overlay2.add_toast(adw::Toast::new(&detail));
                    }
                }
                glib::ControlFlow::Continue
            });
        }
    };

    let on_connect: Rc<dyn Fn()> = Rc::new(on_connect);
    {
        let on_connect = on_connect.clone();
        login_btn.connect_clicked(move |_| (on_connect)());
    }
    // Enter key in any field triggers the same path
    {
        let on_connect = on_connect.clone();
        server_entry.connect_activate(move |_| (on_connect)());
    }
    {
        let on_connect = on_connect.clone();
        user_entry.connect_activate(move |_| (on_connect)());
    }
    {
        let on_connect = on_connect.clone();
        pass_entry.connect_activate(move |_| (on_connect)());
    }

    window.present();
}
