// Item stacks, item selectors, and hotbar selection.
//
// `ItemStack` is the control layer's view of one inventory slot. For
// selector matching it converts to a JSON document:
//
//     { "id": "iron_pickaxe", "Count": 1, "tag": { ... } }
//
// An `ItemSelector` picks a stack by item id, by predicate (a Rust closure
// or a script function receiving that document), or by a JSON pattern that
// must partially match it: every key of a pattern object must match in the
// stack, every element of a pattern list must match some element of the
// stack's list, and scalars compare by value.
//
// `pick` selects a matching item into the player's hand. A match already in
// the hotbar is simply selected. Otherwise the first empty hotbar slot,
// cycling from the selected one, is selected (the selected slot itself if
// the hotbar is full) and the host swaps the item into it.

use crate::error::ControlError;
use crate::host::GameClient;
use crate::scheduler::TickScheduler;
use crate::script::ScriptValue;
use crate::session::ControlSession;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use tracing::debug;

/// One inventory slot's contents. An empty slot has count 0.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item: String,
    pub count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<Value>,
}

impl ItemStack {
    pub fn new(item: impl Into<String>, count: u32) -> Self {
        Self {
            item: item.into(),
            count,
            tag: None,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_tag(mut self, tag: Value) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0 || self.item.is_empty()
    }

    /// The document selectors match against.
    pub fn to_json(&self) -> Value {
        let mut doc = json!({ "id": self.item, "Count": self.count });
        if let (Some(tag), Value::Object(map)) = (&self.tag, &mut doc) {
            map.insert("tag".to_string(), tag.clone());
        }
        doc
    }
}

/// Predicate selector over one stack.
pub type StackPredicate = Box<dyn FnMut(&ItemStack) -> Result<bool, ControlError>>;

/// How `pick` chooses a stack.
pub enum ItemSelector {
    Id(String),
    Predicate(StackPredicate),
    Pattern(Value),
}

impl ItemSelector {
    pub fn predicate(f: impl FnMut(&ItemStack) -> Result<bool, ControlError> + 'static) -> Self {
        ItemSelector::Predicate(Box::new(f))
    }

    /// Interpret a script value: a string is an item id, a function is a
    /// predicate over the stack document, an object is a pattern.
    pub fn from_script(value: &ScriptValue) -> Result<Self, ControlError> {
        match value {
            ScriptValue::String(id) => Ok(ItemSelector::Id(id.clone())),
            ScriptValue::Function(f) => {
                let f = f.clone();
                Ok(ItemSelector::predicate(move |stack| {
                    f(&[ScriptValue::from(stack.to_json())])?.as_bool()
                }))
            }
            ScriptValue::Object(_) => Ok(ItemSelector::Pattern(value.to_json())),
            other => Err(ControlError::MalformedSelector(format!(
                "expected item id, function or object, got {}",
                other.kind()
            ))),
        }
    }

    pub fn matches(&mut self, stack: &ItemStack) -> Result<bool, ControlError> {
        match self {
            ItemSelector::Id(id) => Ok(!stack.is_empty() && stack.item == *id),
            ItemSelector::Predicate(f) => f(stack),
            ItemSelector::Pattern(pattern) => Ok(json_matches(pattern, &stack.to_json())),
        }
    }
}

impl fmt::Debug for ItemSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemSelector::Id(id) => f.debug_tuple("Id").field(id).finish(),
            ItemSelector::Predicate(_) => f.write_str("Predicate(..)"),
            ItemSelector::Pattern(p) => f.debug_tuple("Pattern").field(p).finish(),
        }
    }
}

/// Partial structural match of `value` against `pattern`.
pub fn json_matches(pattern: &Value, value: &Value) -> bool {
    match (pattern, value) {
        (Value::Null, _) => true,
        (Value::Object(want), Value::Object(have)) => want
            .iter()
            .all(|(k, w)| have.get(k).is_some_and(|h| json_matches(w, h))),
        (Value::Array(want), Value::Array(have)) => want
            .iter()
            .all(|w| have.iter().any(|h| json_matches(w, h))),
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (a, b) => a == b,
    }
}

/// Clamp a requested slot into the hotbar.
pub fn clamp_hotbar_slot(slot: i64, hotbar_size: usize) -> usize {
    let last = hotbar_size.saturating_sub(1) as i64;
    slot.clamp(0, last) as usize
}

pub fn selected_slot<S: TickScheduler>(
    session: &mut ControlSession<'_, S>,
) -> Result<usize, ControlError> {
    Ok(session.client()?.inventory().selected_slot())
}

pub fn set_selected_slot<S: TickScheduler>(
    session: &mut ControlSession<'_, S>,
    slot: i64,
) -> Result<(), ControlError> {
    let slot = clamp_hotbar_slot(slot, session.config().hotbar_size);
    session.client()?.inventory().set_selected_slot(slot);
    Ok(())
}

/// Put the first stack matching `selector` into the player's hand. Returns
/// false when nothing matches.
pub fn pick<S: TickScheduler>(
    session: &mut ControlSession<'_, S>,
    selector: &mut ItemSelector,
) -> Result<bool, ControlError> {
    let hotbar = session.config().hotbar_size.max(1);
    // Predicates may be script code; match against a copy with the client
    // released.
    let slots = session.client()?.inventory().main_slots().to_vec();
    let mut found = None;
    for (i, stack) in slots.iter().enumerate() {
        if selector.matches(stack)? {
            found = Some(i);
            break;
        }
    }
    let Some(slot) = found else {
        debug!(target: "script", ?selector, "pick: no matching stack");
        return Ok(false);
    };

    let mut client = session.client()?;
    let inventory = client.inventory();

    if slot < hotbar {
        inventory.set_selected_slot(slot);
        return Ok(true);
    }

    let start = inventory.selected_slot().min(hotbar - 1);
    let mut target = start;
    loop {
        let empty = inventory
            .main_slots()
            .get(target)
            .is_none_or(ItemStack::is_empty);
        if empty {
            break;
        }
        target = (target + 1) % hotbar;
        if target == start {
            break;
        }
    }
    inventory.set_selected_slot(target);
    inventory.pick_from_inventory(slot);
    debug!(target: "script", slot, hotbar_slot = target, "pick: swapped into hotbar");
    Ok(true)
}

pub fn open_container<S: TickScheduler>(
    session: &mut ControlSession<'_, S>,
) -> Result<Option<u32>, ControlError> {
    Ok(session.client()?.inventory().open_container())
}

/// Close the open container screen, if any.
pub fn close_container<S: TickScheduler>(
    session: &mut ControlSession<'_, S>,
) -> Result<(), ControlError> {
    let mut client = session.client()?;
    let inventory = client.inventory();
    if inventory.open_container().is_some() {
        inventory.close_container();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ControlConfig;
    use crate::scheduler::LocalScheduler;
    use crate::testing::TestHost;

    fn host_with(items: &[(usize, ItemStack)]) -> TestHost {
        let mut host = TestHost::flat(2);
        for (slot, stack) in items {
            host.slots[*slot] = stack.clone();
        }
        host
    }

    #[test]
    fn stack_document_has_id_count_and_tag() {
        let stack = ItemStack::new("stone", 3).with_tag(json!({ "Damage": 2 }));
        assert_eq!(
            stack.to_json(),
            json!({ "id": "stone", "Count": 3, "tag": { "Damage": 2 } })
        );
        assert_eq!(
            ItemStack::new("dirt", 1).to_json(),
            json!({ "id": "dirt", "Count": 1 })
        );
    }

    #[test]
    fn pattern_matches_partially() {
        let doc = json!({
            "id": "bow",
            "Count": 1,
            "tag": { "Enchantments": [{ "id": "power", "lvl": 5 }, { "id": "flame", "lvl": 1 }] }
        });
        assert!(json_matches(&json!({ "id": "bow" }), &doc));
        assert!(json_matches(
            &json!({ "tag": { "Enchantments": [{ "id": "flame" }] } }),
            &doc
        ));
        assert!(!json_matches(
            &json!({ "tag": { "Enchantments": [{ "id": "mending" }] } }),
            &doc
        ));
        assert!(!json_matches(&json!({ "id": "arrow" }), &doc));
        assert!(json_matches(&json!({ "Count": 1.0 }), &doc));
    }

    #[test]
    fn clamps_slot_into_hotbar() {
        assert_eq!(clamp_hotbar_slot(-3, 9), 0);
        assert_eq!(clamp_hotbar_slot(4, 9), 4);
        assert_eq!(clamp_hotbar_slot(20, 9), 8);
    }

    #[test]
    fn set_selected_slot_is_clamped() {
        let mut scheduler = LocalScheduler::new(TestHost::flat(2));
        let mut session = ControlSession::new(&mut scheduler, ControlConfig::default());
        set_selected_slot(&mut session, 12).unwrap();
        assert_eq!(selected_slot(&mut session).unwrap(), 8);
    }

    #[test]
    fn pick_selects_hotbar_match_directly() {
        let mut scheduler = LocalScheduler::new(host_with(&[(4, ItemStack::new("torch", 16))]));
        let mut session = ControlSession::new(&mut scheduler, ControlConfig::default());
        let mut selector = ItemSelector::Id("torch".into());
        assert!(pick(&mut session, &mut selector).unwrap());
        drop(session);
        assert_eq!(scheduler.host().selected, 4);
        assert!(scheduler.host().picked.is_empty());
    }

    #[test]
    fn pick_swaps_from_main_inventory_into_empty_hotbar_slot() {
        let mut host = host_with(&[
            (2, ItemStack::new("dirt", 64)),
            (3, ItemStack::new("dirt", 64)),
            (20, ItemStack::new("bread", 5)),
        ]);
        host.selected = 2;
        let mut scheduler = LocalScheduler::new(host);
        let mut session = ControlSession::new(&mut scheduler, ControlConfig::default());
        let mut selector = ItemSelector::predicate(|s| Ok(s.item == "bread"));
        assert!(pick(&mut session, &mut selector).unwrap());
        drop(session);
        let host = scheduler.host();
        assert_eq!(host.selected, 4);
        assert_eq!(host.picked, vec![20]);
        assert_eq!(host.slots[4].item, "bread");
    }

    #[test]
    fn pick_uses_selected_slot_when_hotbar_full() {
        let mut host = host_with(&[(30, ItemStack::new("bread", 5))]);
        for slot in 0..9 {
            host.slots[slot] = ItemStack::new("cobblestone", 64);
        }
        host.selected = 6;
        let mut scheduler = LocalScheduler::new(host);
        let mut session = ControlSession::new(&mut scheduler, ControlConfig::default());
        let mut selector = ItemSelector::Pattern(json!({ "id": "bread" }));
        assert!(pick(&mut session, &mut selector).unwrap());
        drop(session);
        assert_eq!(scheduler.host().selected, 6);
        assert_eq!(scheduler.host().picked, vec![30]);
    }

    #[test]
    fn pick_without_match_changes_nothing() {
        let mut scheduler = LocalScheduler::new(host_with(&[(1, ItemStack::new("dirt", 1))]));
        let mut session = ControlSession::new(&mut scheduler, ControlConfig::default());
        let mut selector = ItemSelector::Id("diamond".into());
        assert!(!pick(&mut session, &mut selector).unwrap());
        drop(session);
        assert_eq!(scheduler.host().selected, 0);
    }

    #[test]
    fn script_selector_shapes() {
        assert!(matches!(
            ItemSelector::from_script(&ScriptValue::from("stone")).unwrap(),
            ItemSelector::Id(_)
        ));
        let err = ItemSelector::from_script(&ScriptValue::Number(3.0)).unwrap_err();
        assert!(matches!(err, ControlError::MalformedSelector(_)));

        let mut by_fn = ItemSelector::from_script(&ScriptValue::function(|args| {
            Ok(ScriptValue::Bool(args[0].get("Count").and_then(|c| c.as_number().ok()) == Some(7.0)))
        }))
        .unwrap();
        assert!(by_fn.matches(&ItemStack::new("arrow", 7)).unwrap());
        assert!(!by_fn.matches(&ItemStack::new("arrow", 6)).unwrap());
    }

    #[test]
    fn close_container_only_when_open() {
        let mut host = TestHost::flat(2);
        host.container = Some(3);
        let mut scheduler = LocalScheduler::new(host);
        let mut session = ControlSession::new(&mut scheduler, ControlConfig::default());
        assert_eq!(open_container(&mut session).unwrap(), Some(3));
        close_container(&mut session).unwrap();
        assert_eq!(open_container(&mut session).unwrap(), None);
    }
}
