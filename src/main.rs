fn main() {
    cashout::machine::run(std::env::args().skip(1));
}
