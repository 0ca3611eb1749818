fn main() {
    // ESP-IDF link arguments are only needed when building the firmware image.
    // Host builds (tests, fuzzing) skip embuild entirely.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
