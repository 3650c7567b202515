use stackmake::config::DesignFile;
use stackmake::plan::{self, BuildPlan};
use stackmake::stacks;

fn plans(doc: &str) -> Vec<BuildPlan> {
    let file: DesignFile = toml::from_str(doc).unwrap();
    let design = file.into_design();
    let stacks = stacks::resolve(&design);
    plan::build_plans(&design, &stacks)
}

fn single_plan(doc: &str) -> BuildPlan {
    let mut plans = plans(doc);
    assert_eq!(plans.len(), 1);
    plans.remove(0)
}

#[test]
fn command_falls_through_to_the_hardware_view() {
    let plan = single_plan(
        r#"
[[hardware]]
instance = "hardware_0"
[hardware.view]
name = "firmware"
[[hardware.view.build]]
file_type = "cSource"
command = "super_asm"
flags = "-hw"

[[software]]
instance = "software_0"
hardware = "hardware_0"
[software.view]
name = "default"
[[software.view.build]]
file_type = "cSource"
command = ""
flags = "-sw"
[[software.filesets]]
name = "someFileSet"
[[software.filesets.builders]]
file_type = "cSource"
command = ""
flags = "-lrt"
[[software.filesets.files]]
path = "array.c"
[software.filesets.files.build]
command = ""
flags = "-u"
"#,
    );

    assert_eq!(plan.objects.len(), 1);
    assert_eq!(plan.objects[0].compiler, "super_asm");
    assert_eq!(plan.objects[0].flags, "-u -lrt -sw -hw");
}

#[test]
fn file_override_takes_the_command_but_keeps_appending_flags() {
    let plan = single_plan(
        r#"
[[hardware]]
instance = "hardware_0"
[hardware.view]
name = "firmware"

[[software]]
instance = "software_0"
hardware = "hardware_0"
[software.view]
name = "default"
[[software.view.build]]
file_type = "cSource"
command = "gcc -o"
flags = "-sw"
[[software.filesets]]
name = "someFileSet"
[[software.filesets.files]]
path = "array.c"
[software.filesets.files.build]
command = "python"
flags = "-l"
"#,
    );

    assert_eq!(plan.objects[0].compiler, "python");
    assert_eq!(plan.objects[0].flags, "-l -sw");
}

#[test]
fn file_replace_excludes_every_less_specific_scope() {
    let plan = single_plan(
        r#"
[[hardware]]
instance = "hardware_0"
[hardware.view]
name = "firmware"
[[hardware.view.build]]
file_type = "cSource"
command = "gcc"
flags = "-hw"

[[software]]
instance = "software_0"
hardware = "hardware_0"
[software.view]
name = "default"
[[software.view.build]]
file_type = "cSource"
command = "gcc"
flags = "-sw"
[[software.filesets]]
name = "someFileSet"
[[software.filesets.files]]
path = "array.c"
[software.filesets.files.build]
command = ""
flags = "-u"
replace = true
"#,
    );

    assert_eq!(plan.objects[0].compiler, "gcc");
    assert_eq!(plan.objects[0].flags, "-u");
}

#[test]
fn a_file_replace_still_surfaces_the_view_flags_for_the_link_line() {
    let plan = single_plan(
        r#"
[[hardware]]
instance = "hardware_0"
[hardware.view]
name = "firmware"
[[hardware.view.build]]
file_type = "cSource"
command = "gcc"

[[software]]
instance = "software_0"
hardware = "hardware_0"
[software.view]
name = "default"
[[software.view.build]]
file_type = "cSource"
command = "gcc"
flags = "-sw"
[[software.filesets]]
name = "someFileSet"
[[software.filesets.files]]
path = "array.c"
[software.filesets.files.build]
command = ""
flags = "-u"
replace = true
"#,
    );

    // The replace keeps the view off the compile rule, not off the
    // executable.
    assert_eq!(plan.objects[0].flags, "-u");
    assert_eq!(plan.sw_view_flags, vec!["-sw".to_string()]);
}

#[test]
fn fileset_replace_stops_below_the_views() {
    let plan = single_plan(
        r#"
[[hardware]]
instance = "hardware_0"
[hardware.view]
name = "firmware"
[[hardware.view.build]]
file_type = "cSource"
command = "gcc"
flags = "-hw"

[[software]]
instance = "software_0"
hardware = "hardware_0"
[software.view]
name = "default"
[[software.view.build]]
file_type = "cSource"
command = "gcc"
flags = "-sw"
[[software.filesets]]
name = "someFileSet"
[[software.filesets.builders]]
file_type = "cSource"
command = "javac -beef"
flags = "-lrt"
replace = true
[[software.filesets.files]]
path = "array.c"
"#,
    );

    assert_eq!(plan.objects[0].compiler, "javac -beef");
    assert_eq!(plan.objects[0].flags, "-lrt");
}

#[test]
fn software_view_replace_excludes_hardware_flags_from_the_unit() {
    let plan = single_plan(
        r#"
[[hardware]]
instance = "hardware_0"
[hardware.view]
name = "firmware"
[[hardware.view.build]]
file_type = "cSource"
command = "gcc"
flags = "-hw"

[[software]]
instance = "software_0"
hardware = "hardware_0"
[software.view]
name = "default"
[[software.view.build]]
file_type = "cSource"
command = "gcc"
flags = "-sw"
replace = true
[[software.filesets]]
name = "someFileSet"
[[software.filesets.files]]
path = "array.c"
"#,
    );

    assert_eq!(plan.objects[0].flags, "-sw");
    // The hardware view still links the executable.
    assert_eq!(plan.linker, "gcc");
    assert_eq!(plan.link_flags, "-hw");
}

#[test]
fn hardware_builder_applies_when_the_software_has_no_view() {
    let plan = single_plan(
        r#"
[[hardware]]
instance = "hardware_0"
[hardware.view]
name = "firmware"
[[hardware.view.build]]
file_type = "cSource"
command = "super_asm"
flags = "-hw"

[[software]]
instance = "software_0"
hardware = "hardware_0"
[[software.filesets]]
name = "someFileSet"
[[software.filesets.builders]]
file_type = "cSource"
command = ""
flags = "-lrt"
[[software.filesets.files]]
path = "array.c"
[software.filesets.files.build]
command = ""
flags = "-u"
"#,
    );

    assert_eq!(plan.objects[0].compiler, "super_asm");
    assert_eq!(plan.objects[0].flags, "-u -lrt -hw");
    assert!(plan.sw_view_flags.is_empty());
}

#[test]
fn hardware_owned_files_never_see_a_software_view() {
    let plan = single_plan(
        r#"
[[hardware]]
instance = "hardware_0"
[hardware.view]
name = "firmware"
[[hardware.view.build]]
file_type = "cSource"
command = "super_asm"
flags = "-hw"
[[hardware.filesets]]
name = "hardFileSet"
[[hardware.filesets.builders]]
file_type = "cSource"
command = ""
flags = "-hset"
[[hardware.filesets.files]]
path = "harray.c"
[hardware.filesets.files.build]
command = ""
flags = "-hu"

[[software]]
instance = "software_0"
hardware = "hardware_0"
[software.view]
name = "default"
[[software.view.build]]
file_type = "cSource"
command = ""
flags = "-sw"
[[software.filesets]]
name = "softFileSet"
[[software.filesets.builders]]
file_type = "cSource"
command = ""
flags = "-sset"
[[software.filesets.files]]
path = "sarray.c"
[software.filesets.files.build]
command = ""
flags = "-su"
"#,
    );

    // Hardware files come first in discovery order.
    assert_eq!(plan.objects[0].file_name, "harray.c");
    assert_eq!(plan.objects[0].flags, "-hu -hset -hw");
    assert_eq!(plan.objects[1].file_name, "sarray.c");
    assert_eq!(plan.objects[1].flags, "-su -sset -sw -hw");
}

#[test]
fn software_view_flags_are_collected_per_stack() {
    let plans = plans(
        r#"
[[hardware]]
instance = "hardware_0"
[hardware.view]
name = "firmware"
[[hardware.view.build]]
file_type = "cSource"
command = "hopo"
flags = "-hw"

[[software]]
instance = "crapware_0"
hardware = "hardware_0"
[[software.filesets]]
name = "alphaFileSet"
[[software.filesets.files]]
path = "array.c"

[[software]]
instance = "stackware_0"
hardware = "hardware_0"
[software.view]
name = "default"
[[software.view.build]]
file_type = "cSource"
command = "asm-meister"
flags = "-bmw"
[[software.filesets]]
name = "betaFileSet"
[[software.filesets.files]]
path = "additional.c"
"#,
    );

    assert_eq!(plans.len(), 2);
    assert!(plans[0].sw_view_flags.is_empty());
    assert_eq!(plans[1].sw_view_flags, vec!["-bmw".to_string()]);
    assert_eq!(plans[1].objects[0].compiler, "asm-meister");
    assert_eq!(plans[1].objects[0].flags, "-bmw -hw");
}
