use gramtab::{
    first_sets::FirstSets, follow_sets::FollowSets, grammar::Grammar, ll1, lr0::Automaton,
    parse_table::LR0Table,
};
use std::{env, path::PathBuf};

fn load(name: &str) -> Grammar {
    Grammar::from_file(
        PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap()).join(format!("tests/{}.g", name)),
    )
    .unwrap()
}

macro_rules! define_tests {
    ($($name:ident),*$(,)?) => {$(
        #[test]
        fn $name() {
            let grammar = load(stringify!($name));

            let first = FirstSets::new(&grammar);
            let follow = FollowSets::new(&grammar, &first);
            let conflicts = ll1::check(&grammar, &first, &follow);
            if conflicts.is_empty() {
                let table = ll1::LL1Table::generate(&grammar, &first, &follow);
                let _ = table.to_csv(&grammar);
            }

            let automaton = Automaton::generate(&grammar);
            let table = LR0Table::generate(&grammar, &automaton);
            let _ = table.to_csv(&grammar);
        }
    )*};
}

define_tests! {
    arithmetic,
    balanced,
    list,
    nested,
}

#[test]
fn arithmetic_is_ll1() {
    let grammar = load("arithmetic");
    let first = FirstSets::new(&grammar);
    let follow = FollowSets::new(&grammar, &first);
    assert!(ll1::check(&grammar, &first, &follow).is_empty());
}

#[test]
fn ambiguous_prefix_is_not_ll1() {
    let grammar = load("ambiguous_prefix");
    let first = FirstSets::new(&grammar);
    let follow = FollowSets::new(&grammar, &first);
    let conflicts = ll1::check(&grammar, &first, &follow);
    assert!(!conflicts.is_empty());
    // The report is human-readable.
    for conflict in &conflicts {
        assert!(!conflict.display(&grammar).to_string().is_empty());
    }
}
