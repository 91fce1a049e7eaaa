use gtk4 as gtk;
use gtk4::prelude::*;

/// Routing targets the backend knows how to dispatch to. The first entry
/// leaves routing to the backend's own default.
// TODO: fetch this list from the server once it exposes one.
const AGENTS: &[(&str, Option<&str>)] = &[
    ("Automatic", None),
    ("Archivist", Some("archivist")),
    ("Researcher", Some("researcher")),
];

pub struct AgentSidebar {
    root: gtk::Box,
    list: gtk::ListBox,
}

impl AgentSidebar {
    pub fn new() -> Self {
        let root = gtk::Box::new(gtk::Orientation::Vertical, 6);
        root.set_margin_top(8);
        root.set_margin_bottom(8);
        root.set_margin_start(8);
        root.set_margin_end(8);

        let title = gtk::Label::new(Some("Agents"));
        title.add_css_class("heading");
        title.set_halign(gtk::Align::Start);
        root.append(&title);

        let list = gtk::ListBox::new();
        for (label, _) in AGENTS {
            let row = gtk::ListBoxRow::new();
            let label = gtk::Label::new(Some(label));
            label.set_margin_top(8);
            label.set_margin_bottom(8);
            label.set_margin_start(8);
            label.set_margin_end(8);
            label.set_halign(gtk::Align::Start);
            row.set_child(Some(&label));
            list.append(&row);
        }
        list.select_row(list.row_at_index(0).as_ref());
        root.append(&list);

        Self { root, list }
    }

    pub fn widget(&self) -> gtk::Widget {
        self.root.clone().upcast()
    }

    /// Invoke `f` with the routing tag of the newly selected entry; `None`
    /// means default routing.
    pub fn connect_agent_selected<F: Fn(Option<String>) + 'static>(&self, f: F) {
        self.list.connect_row_selected(move |_, row| {
            let agent = row
                .and_then(|r| usize::try_from(r.index()).ok())
                .and_then(|idx| AGENTS.get(idx))
                .and_then(|(_, tag)| tag.map(str::to_string));
            f(agent);
        });
    }
}
