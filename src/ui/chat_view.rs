use gtk4 as gtk;
use gtk4::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;

use crate::api::models::{ChatMessage, MessageOrigin};

type SendHandler = dyn Fn(String);

pub struct ChatView {
    root: gtk::Box,
    scroller: gtk::ScrolledWindow,
    messages_box: gtk::Box,
    pending_label: gtk::Label,
    on_send: Rc<RefCell<Option<Box<SendHandler>>>>,
}

impl ChatView {
    pub fn new() -> Self {
        let root = gtk::Box::new(gtk::Orientation::Vertical, 6);
        root.set_margin_top(8);
        root.set_margin_bottom(8);
        root.set_margin_start(8);
        root.set_margin_end(8);

        let scroller = gtk::ScrolledWindow::builder()
            .vexpand(true)
            .hexpand(true)
            .build();
        let messages_box = gtk::Box::new(gtk::Orientation::Vertical, 6);
        scroller.set_child(Some(&messages_box));
        root.append(&scroller);

        let pending_label = gtk::Label::new(None);
        pending_label.add_css_class("dim-label");
        pending_label.set_halign(gtk::Align::Start);
        pending_label.set_visible(false);
        root.append(&pending_label);

        // Input row
        let input_row = gtk::Box::new(gtk::Orientation::Horizontal, 6);
        let entry = gtk::Entry::new();
        entry.set_hexpand(true);
        entry.set_placeholder_text(Some("Type a message…"));
        let send_btn = gtk::Button::with_label("Send");
        send_btn.add_css_class("suggested-action");
        input_row.append(&entry);
        input_row.append(&send_btn);
        root.append(&input_row);

        let on_send: Rc<RefCell<Option<Box<SendHandler>>>> = Rc::new(RefCell::new(None));
        {
            let entry_for_send = entry.clone();
            let on_send = on_send.clone();
            let send: Rc<dyn Fn()> = Rc::new(move || {
                let text = entry_for_send.text().trim().to_string();
                if text.is_empty() {
                    return;
                }
                entry_for_send.set_text("");
                if let Some(handler) = on_send.borrow().as_ref() {
                    handler(text);
                }
            });
            {
                let send = send.clone();
                send_btn.connect_clicked(move |_| (send)());
            }
            {
                let send = send.clone();
                entry.connect_activate(move |_| (send)());
            }
        }

        Self {
            root,
            scroller,
            messages_box,
            pending_label,
            on_send,
        }
    }

    pub fn widget(&self) -> gtk::Widget {
        self.root.clone().upcast()
    }

    pub fn connect_send<F: Fn(String) + 'static>(&self, f: F) {
        *self.on_send.borrow_mut() = Some(Box::new(f));
    }

    pub fn set_messages(&self, messages: &[ChatMessage]) {
        while let Some(child) = self.messages_box.first_child() {
            self.messages_box.remove(&child);
        }
        for msg in messages {
            self.messages_box.append(&Self::message_row(msg));
        }
        self.scroll_to_bottom();
    }

    pub fn push_message(&self, msg: &ChatMessage) {
        self.messages_box.append(&Self::message_row(msg));
        self.scroll_to_bottom();
    }

    /// Show which routing target the screen is waiting on, if any.
    pub fn set_pending(&self, waiting: Option<Option<&str>>) {
        match waiting {
            Some(Some(agent)) => {
                self.pending_label.set_text(&format!("waiting for {agent}…"));
                self.pending_label.set_visible(true);
            }
            Some(None) => {
                self.pending_label.set_text("waiting for a reply…");
                self.pending_label.set_visible(true);
            }
            None => self.pending_label.set_visible(false),
        }
    }

    fn message_row(msg: &ChatMessage) -> gtk::Label {
        let label = gtk::Label::new(None);
        label.set_wrap(true);
        label.set_xalign(0.0);
        match msg.origin {
            MessageOrigin::User => {
                label.set_text(&msg.text);
                label.set_halign(gtk::Align::End);
            }
            MessageOrigin::Agent => {
                let who = msg.agent.as_deref().unwrap_or("bot");
                let when = crate::utils::format_timestamp(&msg.timestamp);
                label.set_text(&format!("{who} [{when}]  {}", msg.text));
                label.set_halign(gtk::Align::Start);
            }
            MessageOrigin::Error => {
                label.set_text(&msg.text);
                label.set_halign(gtk::Align::Start);
                label.add_css_class("error");
            }
        }
        label
    }

    fn scroll_to_bottom(&self) {
        let adj = self.scroller.vadjustment();
        adj.set_value(adj.upper());
    }
}
