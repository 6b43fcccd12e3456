fn main() {
    inkpad::run();
}
