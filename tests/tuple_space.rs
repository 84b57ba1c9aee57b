use mist::{Partition, Tuple, TupleSpace};
use std::ops::Range;

macro_rules! check_count {
    ($($name:ident: $space:expr => $count:expr;)*) => {
        $(
        #[test]
        fn $name() {
            let space = $space;
            assert_eq!(space.count_tuples(), $count);
            if $count <= 10_000 {
                check_ranges(&space);
            }
        }
        )*
    }
}

check_count! {
    pairs_of_100: TupleSpace::all_combinations(100, 2).unwrap() => 4950;
    singles_of_10: TupleSpace::all_combinations(10, 1).unwrap() => 10;
    triples_of_333: TupleSpace::all_combinations(333, 3).unwrap() => 6_099_006;
    a_cross_b: grouped(11, &[("A", 0..10), ("B", 10..11)], &[&["A", "B"]]) => 10;
    a_cross_b_cross_c: grouped(
        13,
        &[("A", 0..10), ("B", 10..12), ("C", 12..13)],
        &[&["A", "B", "C"]]
    ) => 20;
    templates_add_up: grouped(
        201,
        &[("A", 0..100), ("B", 200..201)],
        &[&["A", "B"], &["A", "A"]]
    ) => 100 + 4950;
    repeated_and_crossed: grouped(
        12,
        &[("A", 0..6), ("B", 4..9)],
        &[&["A", "B", "A"], &["B", "B", "B"]]
    ) => 15 * 5 + 10;
}

fn grouped(nvars: usize, groups: &[(&str, Range<usize>)], templates: &[&[&str]]) -> TupleSpace {
    let mut space = TupleSpace::new(nvars).unwrap();
    for (name, members) in groups {
        let members: Vec<usize> = members.clone().collect();
        space.add_variable_group(name, &members).unwrap();
    }
    for template in templates {
        space.add_named_group_tuple(template).unwrap();
    }
    space
}

fn check_ranges(space: &TupleSpace) {
    let count = space.count_tuples();
    let all: Vec<Tuple> = space.tuples().collect();
    assert_eq!(all.len() as u64, count);

    // any way of dividing the space into ranks must cover it exactly once, in order
    for total_ranks in [2, 3, 7, 64] {
        let mut stitched = Vec::new();
        for rank in 0..total_ranks {
            let range = Partition::new(rank, 1, total_ranks).range(count);
            stitched.extend(space.tuples_in(range));
        }
        assert_eq!(stitched, all, "{} ranks", total_ranks);
    }

    for (index, tuple) in all.iter().enumerate().step_by(7) {
        assert_eq!(space.tuple_at(index as u64).as_ref(), Some(tuple));
    }
    assert_eq!(space.tuple_at(count), None);
}

#[test]
fn overlapping_groups_repeat_tuples_across_templates() {
    let space = grouped(5, &[("A", 0..3), ("B", 1..4)], &[&["A", "A"], &["B", "B"]]);
    let tuples: Vec<Vec<usize>> = space.tuples().map(|t| t.as_slice().to_vec()).collect();
    assert_eq!(
        tuples,
        [[0, 1], [0, 2], [1, 2], [1, 2], [1, 3], [2, 3]]
    );
}

#[test]
fn repeated_group_draws_strictly_increase() {
    let space = grouped(
        12,
        &[("A", 0..6), ("B", 4..9)],
        &[&["A", "B", "A"], &["B", "B", "B"]],
    );
    let tuples: Vec<Tuple> = space.tuples().collect();
    for t in &tuples[..75] {
        assert!(t[0] < t[2], "{:?}", t);
    }
    for t in &tuples[75..] {
        assert!(t[0] < t[1] && t[1] < t[2], "{:?}", t);
    }
    let last = space.tuple_at(space.count_tuples() - 1).unwrap();
    assert_eq!(last, Tuple::new(&[6, 7, 8]));
}

#[test]
fn huge_space_seeks_without_enumerating() {
    let space = TupleSpace::all_combinations(333, 3).unwrap();
    assert_eq!(space.tuple_at(0), Some(Tuple::new(&[0, 1, 2])));
    assert_eq!(
        space.tuple_at(space.count_tuples() - 1),
        Some(Tuple::new(&[330, 331, 332]))
    );
    let tail: Vec<Tuple> = space.tuples_in(6_099_004..u64::MAX).collect();
    assert_eq!(
        tail,
        [Tuple::new(&[329, 331, 332]), Tuple::new(&[330, 331, 332])]
    );
}

#[test]
fn named_groups_are_listed_in_order() {
    let space = grouped(4, &[("x", 2..4), ("y", 0..1)], &[&["x", "y"]]);
    let groups: Vec<(&str, &[usize])> = space.groups().collect();
    assert_eq!(groups, [("x", &[2, 3][..]), ("y", &[0][..])]);
    assert_eq!(space.arity(), Some(2));
}
